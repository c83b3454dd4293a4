#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use lazydsgen::{ArtifactExecutor, CodeGenerator, Error, InputData, Result};
use serde_json::Value;

/// Replays canned completions in order; repeats the last one when exhausted.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<VecDeque<Result<String>>>>,
    last: Arc<Mutex<Option<Result<String>>>>,
    pub calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into())),
            ..Default::default()
        }
    }

    pub fn always(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str, _model: &str, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(reply) => {
                *self.last.lock().unwrap() = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| Err(Error::generation("no reply scripted"))),
        }
    }
}

/// Understands a tiny line protocol instead of running code:
/// `RETURN <json>`, `RAISE <msg>`, anything else is an artifact error.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    pub occupied: Arc<AtomicBool>,
    pub evictions: Arc<AtomicUsize>,
    pub executions: Arc<AtomicUsize>,
    pub seen_inputs: Arc<Mutex<Vec<Value>>>,
}

impl FakeExecutor {
    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }

    pub fn evictions(&self) -> usize {
        self.evictions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArtifactExecutor for FakeExecutor {
    async fn execute(&self, source: &str, entry_point: &str, input: &InputData) -> Result<Value> {
        assert_eq!(entry_point, "fun_generated");
        assert!(!self.occupied.swap(true, Ordering::SeqCst), "slot reused without eviction");
        self.executions.fetch_add(1, Ordering::SeqCst);
        self.seen_inputs.lock().unwrap().push(input.value().clone());

        let source = source.trim();
        let outcome = if let Some(json) = source.strip_prefix("RETURN ") {
            serde_json::from_str(json).map_err(Error::artifact)
        } else if let Some(msg) = source.strip_prefix("RAISE ") {
            Err(Error::execution(msg))
        } else {
            Err(Error::artifact(format!("SyntaxError: {}", source)))
        };
        self.occupied.store(false, Ordering::SeqCst);
        outcome
    }

    fn evict(&self) -> Result<()> {
        self.evictions.fetch_add(1, Ordering::SeqCst);
        self.occupied.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn has_stale_state(&self) -> bool {
        self.occupied.load(Ordering::SeqCst)
    }
}

pub fn python_available() -> bool {
    std::process::Command::new("python3")
        .arg("--version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
