use std::time::Duration;

/// Tunables for [`crate::TaskPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Account email echoed back to the evaluator.
    pub email: String,
    /// How long to wait for the published site before notifying anyway.
    pub live_timeout: Duration,
    /// Delivery attempts for the evaluation callback.
    pub notify_attempts: u32,
}

impl PipelineConfig {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            live_timeout: Duration::from_secs(300),
            notify_attempts: 5,
        }
    }

    pub fn with_live_timeout(mut self, timeout: Duration) -> Self {
        self.live_timeout = timeout;
        self
    }

    pub fn with_notify_attempts(mut self, attempts: u32) -> Self {
        self.notify_attempts = attempts;
        self
    }
}

/// Settings for [`crate::EvaluationNotifier`].
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Delay after the first failed attempt; doubles after each further one.
    pub base_delay: Duration,
    pub request_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl NotifierConfig {
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Pause after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}
