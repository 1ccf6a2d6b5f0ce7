use ulid::Ulid;

use crate::engine::PolicyError;
use crate::model::{BlockReason, TimeOfDay};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    NotFound(Ulid),
    AlreadyExists(Ulid),
    UnknownOrganization(String),
    /// The whole date is not bookable (advance window, closed day).
    Policy(PolicyError),
    /// The date is bookable but this slot is not.
    SlotUnavailable(BlockReason),
    OutsideWorkingHours(TimeOfDay),
    InvalidInput(&'static str),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "booking not found: {id}"),
            StoreError::AlreadyExists(id) => write!(f, "booking already exists: {id}"),
            StoreError::UnknownOrganization(org) => write!(f, "unknown organization: {org}"),
            StoreError::Policy(e) => write!(f, "date not bookable: {e}"),
            StoreError::SlotUnavailable(reason) => write!(f, "slot unavailable: {reason}"),
            StoreError::OutsideWorkingHours(t) => {
                write!(f, "{t} is outside working hours")
            }
            StoreError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            StoreError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<PolicyError> for StoreError {
    fn from(e: PolicyError) -> Self {
        StoreError::Policy(e)
    }
}

impl From<BlockReason> for StoreError {
    fn from(reason: BlockReason) -> Self {
        StoreError::SlotUnavailable(reason)
    }
}
