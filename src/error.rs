//! Error handling for the tonezone engine

use crate::cadence::pattern::ToneKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed cadence pattern text. Fatal at load time.
    #[error("Grammar error: {0}")]
    Grammar(String),

    /// Invalid zone table (duplicate ids, bad cadence, unparsable pattern).
    /// Fatal at registry construction.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The zone exists but carries no definition for the requested tone
    /// kind. Recoverable; callers pick a fallback zone.
    #[error("Tone {kind} not specified for zone '{country}'")]
    NotSpecified { country: String, kind: ToneKind },

    /// The synthesis collaborator failed while a tone was playing.
    /// Recoverable per call; terminates only the affected sequencer.
    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Configuration source error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn grammar<S: Into<String>>(msg: S) -> Self {
        Self::Grammar(msg.into())
    }

    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn not_specified<S: Into<String>>(country: S, kind: ToneKind) -> Self {
        Self::NotSpecified {
            country: country.into(),
            kind,
        }
    }

    pub fn playback<S: Into<String>>(msg: S) -> Self {
        Self::Playback(msg.into())
    }

    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_state<S: Into<String>>(msg: S) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// True for conditions a caller is expected to handle rather than abort on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotSpecified { .. } | Self::Playback(_))
    }
}
