//! Session: binds the input data to a generator and an executor and drives
//! the generate, persist, load, invoke cycle.
//!
//! Attempts are strictly sequential. Each one owns the executor's single
//! artifact slot, and stale state is evicted before the first attempt and
//! after the last one on every path.

use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    config::Config,
    data::InputData,
    execution::{ArtifactExecutor, PythonExecutor},
    llm::{CodeGenerator, LlmClient},
    printer::CodePrinter,
    prompt::{build_prompt, strip_code_fences, ENTRY_POINT},
    Result,
};

mod envelope;

pub use envelope::{ResultEnvelope, FAILURE_SENTINEL};

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub n_tries: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            temperature: crate::config::DEFAULT_TEMPERATURE,
            n_tries: crate::config::DEFAULT_TRIES,
        }
    }
}

impl GenerationSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            model: cfg.default_model(),
            temperature: cfg.default_temperature(),
            n_tries: cfg.n_tries(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeOptions {
    /// Print each attempt's code before it runs.
    pub verbose: bool,
    /// Attach `code`, `input` and `prompt` to a successful envelope.
    pub include_metadata: bool,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self { verbose: false, include_metadata: true }
    }
}

pub struct Session {
    input: InputData,
    description: String,
    settings: GenerationSettings,
    generator: Box<dyn CodeGenerator>,
    executor: Box<dyn ArtifactExecutor>,
    printer: CodePrinter,
}

impl Session {
    pub fn new(
        input: InputData,
        description: impl Into<String>,
        settings: GenerationSettings,
        generator: impl CodeGenerator + 'static,
        executor: impl ArtifactExecutor + 'static,
    ) -> Self {
        Self {
            input,
            description: description.into(),
            settings,
            generator: Box::new(generator),
            executor: Box::new(executor),
            printer: CodePrinter::default(),
        }
    }

    /// Session backed by the chat-completion client and a local Python.
    ///
    /// Fails with `Error::Configuration` when `OPENAI_API_KEY` is missing.
    pub fn from_config(cfg: &Config, input: InputData, description: impl Into<String>) -> Result<Self> {
        let generator = LlmClient::from_config(cfg)?;
        let executor = PythonExecutor::from_config(cfg)?;
        Ok(Self::new(
            input,
            description,
            GenerationSettings::from_config(cfg),
            generator,
            executor,
        )
        .with_printer(CodePrinter::from_config(cfg)))
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_printer(mut self, printer: CodePrinter) -> Self {
        self.printer = printer;
        self
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn input(&self) -> &InputData {
        &self.input
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn executor(&self) -> &dyn ArtifactExecutor {
        self.executor.as_ref()
    }

    pub fn prompt_for(&self, instruction: &str) -> String {
        build_prompt(instruction, &self.description, self.input.type_name())
    }

    /// One generate, persist, load, invoke cycle. Returns the value and the code that produced it.
    async fn attempt(&self, prompt: &str, attempt: usize, opts: InvokeOptions) -> Result<(Value, String)> {
        let raw = self
            .generator
            .complete(prompt, &self.settings.model, self.settings.temperature)
            .await?;
        // Verbose output shows the completion exactly as the model sent it.
        if opts.verbose {
            self.printer.print(attempt, &raw);
        }
        let code = strip_code_fences(&raw);
        let result = self.executor.execute(&code, ENTRY_POINT, &self.input).await?;
        Ok((result, code))
    }

    fn evict_quietly(&self) {
        if let Err(e) = self.executor.evict() {
            warn!(error = %e, "could not clear generated artifact");
        }
    }

    /// Single attempt. Any failure is returned as is.
    pub async fn invoke(&self, instruction: &str, opts: InvokeOptions) -> Result<ResultEnvelope> {
        self.executor.evict()?;
        let prompt = self.prompt_for(instruction);

        let outcome = self
            .attempt(&prompt, 1, opts)
            .instrument(info_span!("attempt", attempt = 1))
            .await;
        let evicted = self.executor.evict();

        let (result, code) = outcome?;
        evicted?;
        Ok(ResultEnvelope::success(result, code, instruction, prompt, opts.include_metadata))
    }

    /// Up to `n_tries` attempts; the first success wins. When all fail the
    /// minimal sentinel envelope is returned instead of an error.
    pub async fn invoke_with_tries(&self, instruction: &str, opts: InvokeOptions) -> ResultEnvelope {
        self.evict_quietly();
        let prompt = self.prompt_for(instruction);

        let mut failed = 0;
        while failed < self.settings.n_tries {
            let attempt = failed + 1;
            let outcome = self
                .attempt(&prompt, attempt, opts)
                .instrument(info_span!("attempt", attempt))
                .await;
            match outcome {
                Ok((result, code)) => {
                    self.evict_quietly();
                    info!(attempt, "generated function succeeded");
                    return ResultEnvelope::success(result, code, instruction, prompt, opts.include_metadata);
                }
                Err(e) if e.is_attempt_failure() => {
                    failed += 1;
                    warn!(kind = e.kind(), error = %e, "Solution failed for n_tries={}, try another one...", failed);
                }
                Err(e) => {
                    error!(error = %e, "not retrying");
                    break;
                }
            }
        }

        self.evict_quietly();
        ResultEnvelope::failure()
    }
}
