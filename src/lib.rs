//! Runs R scripts on a remote OpenCPU service.
//!
//! A [`Coordinator`] reads the script, marshals the typed input [`Variable`]s into the JSON
//! `args` object, posts both to the `do.call` endpoint and converts the reply back into the
//! caller's output variables.

pub mod config;
pub mod error;
pub mod marshal;
pub mod remote;
pub mod session;
pub mod unmarshal;
pub mod variable;

pub use config::Config;
pub use error::{BridgeError, Result};
pub use remote::OpenCpuClient;
pub use session::{CapturedOutput, Coordinator, Diagnostics, RunOutcome};
pub use unmarshal::ResponseShape;
pub use variable::{Kind, Value, Variable};
