//! Fixed-interval timer trigger (`use: interval`).

use super::{Observers, Trigger};
use crate::factory::{Dependencies, Renderable};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use validator::{Validate, ValidationError};

/// Interval length, as the sum of its parts. At least one part must be set.
///
/// ```yaml
/// on:
///   - id: every-90s
///     use: interval
///     params:
///       minutes: 1
///       seconds: 30
/// ```
#[derive(Debug, Clone, Default, Deserialize, Validate, JsonSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_interval"))]
pub struct IntervalParams {
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    #[serde(default)]
    pub milliseconds: u64,
}

impl IntervalParams {
    /// Total length, or `None` when the parts overflow a `Duration`.
    pub fn checked_duration(&self) -> Option<Duration> {
        let secs = self
            .hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        Duration::from_secs(secs).checked_add(Duration::from_millis(self.milliseconds))
    }

    /// Total length. Saturates at `Duration::MAX`; validated params never do.
    pub fn duration(&self) -> Duration {
        self.checked_duration().unwrap_or(Duration::MAX)
    }
}

fn validate_interval(params: &IntervalParams) -> Result<(), ValidationError> {
    match params.checked_duration() {
        None => Err(ValidationError::new("interval_too_large")),
        Some(duration) if duration.is_zero() => Err(ValidationError::new("interval_must_be_positive")),
        Some(_) => Ok(()),
    }
}

/// Sleeps for the interval, notifies, and repeats until stopped.
///
/// Each cycle is measured from the end of the previous sleep. Drift is not
/// compensated and missed wakeups are not queued.
pub struct IntervalTrigger {
    id: String,
    interval: Duration,
    observers: Observers,
    running: Mutex<Option<CancellationToken>>,
}

impl IntervalTrigger {
    pub fn new(id: impl Into<String>, interval: Duration) -> Self {
        Self {
            id: id.into(),
            interval,
            observers: Observers::new(),
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Renderable for IntervalTrigger {
    type Params = IntervalParams;

    fn build(params: IntervalParams, deps: Dependencies) -> anyhow::Result<Self> {
        Ok(Self::new(deps.step_id(), params.duration()))
    }
}

impl Trigger for IntervalTrigger {
    fn id(&self) -> &str {
        &self.id
    }

    fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Spawns the timer loop on the current tokio runtime.
    fn start(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if running.is_some() {
            return;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let observers = self.observers.clone();
        let id = self.id.clone();
        let interval = self.interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        if cancelled.is_cancelled() {
                            break;
                        }
                        debug!(trigger = %id, "Interval elapsed");
                        observers.notify(&id);
                    }
                }
            }
        });

        info!(trigger = %self.id, interval_ms = self.interval.as_millis() as u64, "Trigger started");
        *running = Some(token);
    }

    fn stop(&self) {
        let token = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(token) = token {
            token.cancel();
            info!(trigger = %self.id, "Trigger stopped");
        }
    }

    fn is_running(&self) -> bool {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Drop for IntervalTrigger {
    fn drop(&mut self) {
        self.stop();
    }
}
