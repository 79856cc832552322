use std::path::PathBuf;

use thiserror::Error;

use crate::fetch::CertSource;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Validation(String),

    #[error("requirement not met: {0}")]
    Requirement(String),

    #[error("failed to fetch the {cert} certificate: {reason:#}")]
    Fetch {
        cert: CertSource,
        reason: anyhow::Error,
    },

    #[error("{context} '{}': {err}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("unable to update the trusted certificate setting: {0:#}")]
    Settings(anyhow::Error),
}

impl Error {
    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Error::Io {
            context,
            path: path.into(),
            err,
        }
    }

    /// Process exit status the binary reports for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Validation(_) => 2,
            Error::Requirement(_) => 3,
            Error::Fetch { .. } => 4,
            Error::Io { .. } | Error::Settings(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
