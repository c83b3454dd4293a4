//! Turn a natural-language instruction about a dataset into a generated
//! Python function, run it, and hand back what it returned.
//!
//! ```no_run
//! use lazydsgen::{Config, InputData, InvokeOptions, Session};
//!
//! # async fn demo() -> lazydsgen::Result<()> {
//! let data = InputData::new(serde_json::json!([{"city": "Lyon", "pop": 522000}]));
//! let session = Session::from_config(&Config::load(), data, "a list of cities with population")?;
//! let envelope = session
//!     .invoke_with_tries("which city is the largest?", InvokeOptions::default())
//!     .await;
//! println!("{}", envelope.result);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod execution;
pub mod llm;
pub mod printer;
pub mod process;
pub mod prompt;
pub mod session;
pub mod utils;

pub use config::Config;
pub use data::InputData;
pub use error::{Error, Result};
pub use execution::{ArtifactExecutor, ArtifactSlot, PythonExecutor};
pub use llm::{CodeGenerator, LlmClient};
pub use session::{GenerationSettings, InvokeOptions, ResultEnvelope, Session, FAILURE_SENTINEL};
