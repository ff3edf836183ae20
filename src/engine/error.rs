use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("you need at least {needed} {resource} but only have {available}")]
    InsufficientResources {
        resource: String,
        needed: u64,
        available: u64,
    },

    #[error("{resource} is locked: you need at least {at_least} {requires} (you have {current})")]
    Locked {
        resource: String,
        requires: String,
        at_least: u64,
        current: u64,
    },

    #[error("failed to persist state: {0}")]
    Persistence(#[from] StoreError),

    #[error("saved state is corrupt: {0}")]
    CorruptState(String),

    #[error("failed to encode state: {0}")]
    Encode(#[source] serde_json::Error),
}
