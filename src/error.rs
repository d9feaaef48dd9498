//! Error taxonomy for a bridge run.

use std::path::PathBuf;

use crate::variable::Kind;

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Another run holds the session.
    #[error("only one R session may run at a time")]
    AlreadyRunning,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no script configured; call configure() before run()")]
    NotConfigured,

    #[error("failed to read script '{}': {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("input '{name}': {reason}")]
    InputBinding { name: String, reason: String },

    #[error("variable '{name}' is declared {expected} but was given {found}")]
    KindMismatch {
        name: String,
        expected: Kind,
        found: Kind,
    },

    /// Transport failure or non-2xx status. Never retried.
    #[error("remote call failed: {0}")]
    RemoteCall(String),

    #[error("unexpected remote response: {0}")]
    ResponseParse(String),

    #[error("output '{name}': {reason}")]
    OutputBinding { name: String, reason: String },
}

impl BridgeError {
    pub(crate) fn input(name: &str, reason: impl Into<String>) -> Self {
        Self::InputBinding { name: name.to_string(), reason: reason.into() }
    }

    pub(crate) fn output(name: &str, reason: impl Into<String>) -> Self {
        Self::OutputBinding { name: name.to_string(), reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
