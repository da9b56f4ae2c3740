//! Crate error type.

use crate::rules::FixAction;

/// Errors surfaced by file helpers and fix application.
///
/// Rule evaluation never returns these to callers of `validate()` — the
/// validators catch them per file and convert them into a synthetic
/// `validation-error` issue instead.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("i/o failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fix '{action}' is missing parameter '{name}'")]
    MissingFixParameter {
        action: FixAction,
        name: &'static str,
    },

    #[error("fix '{action}' found no anchor in {path}")]
    FixAnchor { action: FixAction, path: String },
}

impl GuardError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
