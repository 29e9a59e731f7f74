//! Pipes, triggers and services available under fixed keys in every
//! registry built with [`Registry::with_builtins`].

mod emit;
mod fail;
mod log;
mod values;

pub use emit::{EmitParams, EmitPipe};
pub use fail::{FailParams, FailPipe};
pub use log::{LogLevel, LogParams, LogPipe};
pub use values::{StaticValues, StaticValuesParams};

use crate::engine::CompositePipe;
use crate::factory::Registry;
use crate::triggers::IntervalTrigger;

pub(crate) fn register(registry: &mut Registry) {
    registry
        .register_pipe::<CompositePipe>("composite")
        .register_pipe::<LogPipe>("log")
        .register_pipe::<EmitPipe>("emit")
        .register_pipe::<FailPipe>("fail")
        .register_trigger::<IntervalTrigger>("interval")
        .register_service::<StaticValues>("values");
}
