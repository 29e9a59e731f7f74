//! Step outcome model.
//!
//! A `PipeResult` is what every step hands back to the engine. Results of
//! sibling steps are folded into their parent's result with [`PipeResult::merge`]
//! (also available as the `&` operator) or [`PipeResult::union`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::ops::BitAnd;
use ts_rs::TS;

/// Outcome of one step.
///
/// A result is in exactly one of three states:
/// - succeeded: `succeeded && !was_skipped`
/// - skipped: `was_skipped`
/// - failed: `!succeeded && !was_skipped`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS)]
pub struct PipeResult {
    pub succeeded: bool,

    #[serde(default)]
    pub was_skipped: bool,

    #[serde(default)]
    pub message: String,

    /// Payload that later steps can reference through templates.
    #[serde(default = "empty_data")]
    #[ts(type = "unknown")]
    pub data: Value,
}

fn empty_data() -> Value {
    Value::Object(Map::new())
}

/// Coarse classification of a result, mostly for logging.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    Skipped,
    Succeeded,
    Failed,
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StepState::Skipped => "skipped",
            StepState::Succeeded => "succeeded",
            StepState::Failed => "failed",
        };
        f.write_str(label)
    }
}

impl Default for PipeResult {
    fn default() -> Self {
        Self::success()
    }
}

impl PipeResult {
    /// A successful result with no message and empty data.
    pub fn success() -> Self {
        Self {
            succeeded: true,
            was_skipped: false,
            message: String::new(),
            data: empty_data(),
        }
    }

    /// A failed result carrying a reason.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            was_skipped: false,
            message: message.into(),
            data: empty_data(),
        }
    }

    /// A result for a step that did not run.
    pub fn skipped() -> Self {
        Self {
            succeeded: false,
            was_skipped: true,
            message: String::new(),
            data: empty_data(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    pub fn has_failed(&self) -> bool {
        !self.succeeded && !self.was_skipped
    }

    pub fn state(&self) -> StepState {
        if self.was_skipped {
            StepState::Skipped
        } else if self.succeeded {
            StepState::Succeeded
        } else {
            StepState::Failed
        }
    }

    /// Combine two results.
    ///
    /// Success and skip flags are conjunctive, messages are joined by a
    /// newline and data objects are merged shallowly with `other` winning on
    /// key conflicts.
    pub fn merge(self, other: PipeResult) -> PipeResult {
        let message = match (self.message.is_empty(), other.message.is_empty()) {
            (_, true) => self.message,
            (true, false) => other.message,
            (false, false) => format!("{}\n{}", self.message, other.message),
        };

        PipeResult {
            succeeded: self.succeeded && other.succeeded,
            was_skipped: self.was_skipped && other.was_skipped,
            message,
            data: merge_data(self.data, other.data),
        }
    }

    /// Fold any number of results into one.
    ///
    /// An empty input is a vacuous success; a single result is returned as is.
    pub fn union<I>(results: I) -> PipeResult
    where
        I: IntoIterator<Item = PipeResult>,
    {
        let mut results = results.into_iter();
        match results.next() {
            Some(first) => results.fold(first, PipeResult::merge),
            None => PipeResult::success(),
        }
    }
}

impl BitAnd for PipeResult {
    type Output = PipeResult;

    fn bitand(self, rhs: PipeResult) -> PipeResult {
        self.merge(rhs)
    }
}

fn merge_data(left: Value, right: Value) -> Value {
    match (left, right) {
        (Value::Object(mut left), Value::Object(right)) => {
            left.extend(right);
            Value::Object(left)
        }
        (left, Value::Null) => left,
        (_, right) => right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_constructors() {
        assert!(PipeResult::success().succeeded);
        assert!(!PipeResult::success().has_failed());
        assert!(PipeResult::failure("boom").has_failed());
        assert!(PipeResult::skipped().was_skipped);
        assert!(!PipeResult::skipped().has_failed());
        assert_eq!(PipeResult::skipped().state(), StepState::Skipped);
        assert_eq!(PipeResult::failure("x").state(), StepState::Failed);
    }

    #[test]
    fn test_union_of_nothing_is_success() {
        assert_eq!(PipeResult::union(Vec::new()), PipeResult::success());
    }

    #[test]
    fn test_union_of_one_is_identity() {
        let samples = vec![
            PipeResult::success().with_message("ok").with_data(json!({"a": 1})),
            PipeResult::failure("nope"),
            PipeResult::skipped().with_message("condition not met"),
        ];

        for result in samples {
            assert_eq!(PipeResult::union(vec![result.clone()]), result);
        }
    }

    #[test]
    fn test_merge_flags_and_message() {
        let merged = PipeResult::success().with_message("first") & PipeResult::failure("second");
        assert!(!merged.succeeded);
        assert!(!merged.was_skipped);
        assert_eq!(merged.message, "first\nsecond");

        let both_skipped = PipeResult::skipped() & PipeResult::skipped();
        assert!(both_skipped.was_skipped);
    }

    #[test]
    fn test_merge_data_later_keys_win() {
        let merged = PipeResult::success().with_data(json!({"a": 1, "b": 1}))
            & PipeResult::success().with_data(json!({"b": 2, "c": 3}));
        assert_eq!(merged.data, json!({"a": 1, "b": 2, "c": 3}));
    }

    #[test]
    fn test_data_defaults_to_empty_object() {
        let result: PipeResult = serde_json::from_value(json!({"succeeded": true})).unwrap();
        assert_eq!(result, PipeResult::success());
    }
}
