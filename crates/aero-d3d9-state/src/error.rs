use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("stream {stream} out of range")]
    StreamOutOfRange { stream: usize },

    #[error("stream {stream} frequency divider must be non-zero")]
    ZeroStreamFrequency { stream: usize },

    #[error("all {capacity} enabled-light slots are in use")]
    LightCapacityExhausted { capacity: usize },

    #[error("invalid light index {0:#x}")]
    InvalidLightIndex(u32),
}
