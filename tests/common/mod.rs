//! Shared probes for integration tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use service_health::{Check, CheckFailure, CheckOutcome, Context, HealthError, HealthResult};

/// One scripted response.
#[derive(Clone, Debug)]
pub enum Step {
    Healthy,
    Degraded(&'static str),
    Fail(&'static str),
}

/// A probe that plays back a script, repeating the final step forever.
pub struct ScriptedCheck {
    name: String,
    script: Mutex<VecDeque<Step>>,
    last: Mutex<Step>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl ScriptedCheck {
    pub fn new(name: &str, steps: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            script: Mutex::new(steps.into()),
            last: Mutex::new(Step::Healthy),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Take `delay` before answering.
    #[allow(dead_code)]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Counter of completed evaluations.
    #[allow(dead_code)]
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }

    fn next_step(&self) -> Step {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.script.lock().unwrap().pop_front() {
            *last = step;
        }
        last.clone()
    }
}

#[async_trait]
impl Check for ScriptedCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self, ctx: &Context) -> CheckOutcome {
        if let Err(cause) = ctx.run(tokio::time::sleep(self.delay)).await {
            return Err(CheckFailure::new(cause));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Healthy => Ok(HealthResult::healthy()),
            Step::Degraded(message) => Ok(HealthResult::degraded(message)),
            Step::Fail(message) => Err(CheckFailure::new(HealthError::probe(message))),
        }
    }
}
