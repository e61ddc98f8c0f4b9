use thiserror::Error;

pub type RomResult<T> = Result<T, RomError>;

/// Everything that can go wrong between "user picked a case" and
/// "first field on screen". Fetch and decode failures are terminal for
/// the whole pipeline: a partially decoded dataset cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RomError {
    #[error("Archive download failed: HTTP {status} {reason}")]
    Fetch { status: u16, reason: String },

    #[error("Failed to decode {file}: {detail}")]
    Decode { file: String, detail: String },

    #[error("Archive is missing mandatory file {file}")]
    MissingArtifact { file: String },

    #[error("Protocol violation: {what}")]
    Protocol { what: String },

    #[error("Scene construction failed: {what}")]
    Scene { what: String },
}

impl RomError {
    pub fn decode(file: &str, detail: impl Into<String>) -> Self {
        RomError::Decode {
            file: file.to_string(),
            detail: detail.into(),
        }
    }

    pub fn protocol(what: impl Into<String>) -> Self {
        RomError::Protocol { what: what.into() }
    }
}
