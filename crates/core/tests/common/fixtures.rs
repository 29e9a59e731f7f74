//! Builders for configs used across tests.

use conduit_protocol::{Condition, PipeConfig, RunnerDefinition, TriggerDefinition};

/// A `count` step.
pub fn count(id: &str) -> PipeConfig {
    PipeConfig::new(id, "count")
}

/// A `count` step that returns a failed result.
#[allow(dead_code)]
pub fn failing_count(id: &str) -> PipeConfig {
    PipeConfig::new(id, "count").with_param("succeed", false)
}

/// A composite with the given children.
pub fn composite(id: &str, steps: Vec<PipeConfig>) -> PipeConfig {
    steps
        .into_iter()
        .fold(PipeConfig::new(id, "composite"), PipeConfig::with_step)
}

/// A step that never runs.
#[allow(dead_code)]
pub fn disabled(config: PipeConfig) -> PipeConfig {
    config.with_condition(Condition::Literal(false))
}

/// An interval trigger firing every `millis` milliseconds.
#[allow(dead_code)]
pub fn every_millis(id: &str, millis: u64) -> TriggerDefinition {
    TriggerDefinition::new(id, "interval").with_param("milliseconds", millis)
}

/// A runner executing `run` on `trigger`.
#[allow(dead_code)]
pub fn runner(id: &str, trigger: TriggerDefinition, run: PipeConfig) -> RunnerDefinition {
    RunnerDefinition::new(run).with_id(id).on(trigger)
}
