#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InternalMessage {
    Stop,
    Unlocked {
        resource: String,
        message: Option<String>,
    },
    PersistFailed(String),
    PersistRecovered,
}

/// How a write changed the persistence streak.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistenceChange {
    Unchanged,
    Failed(String),
    Recovered,
}
