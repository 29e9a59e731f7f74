//! `use: values` is a service holding a fixed map of values.
//!
//! Pipes that accept a `values` injection (such as `emit`) read from it.

use crate::factory::{Dependencies, Renderable};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

#[derive(Debug, Clone, Default, Deserialize, Validate, JsonSchema)]
pub struct StaticValuesParams {
    #[serde(default)]
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, Default)]
pub struct StaticValues {
    values: Map<String, Value>,
}

impl StaticValues {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }
}

impl Renderable for StaticValues {
    type Params = StaticValuesParams;

    fn build(params: StaticValuesParams, _deps: Dependencies) -> anyhow::Result<Self> {
        Ok(Self::new(params.values))
    }
}
