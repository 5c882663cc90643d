use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    #[error("failed to load audio '{reference}': {reason}")]
    Load { reference: String, reason: String },
    #[error("audio reference '{0}' is empty or unsupported")]
    UnsupportedReference(String),
    #[error("playback rate must be a positive finite number, got {0}")]
    InvalidRate(f32),
}

impl PlaybackError {
    pub fn load(reference: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        PlaybackError::Load {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}
