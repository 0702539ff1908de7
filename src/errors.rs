use std::fmt;

use crate::domain::{Week, MAX_WEEK};

/// Failures callers are expected to tell apart from infrastructure errors.
/// Raised inside `anyhow::Error` and recovered with `downcast_ref`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    NotFound(String),
    AlreadyExists(String),
    InvalidInput(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::NotFound(what) => write!(f, "{} not found", what),
            PoolError::AlreadyExists(what) => write!(f, "{} already exists", what),
            PoolError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for PoolError {}

pub fn check_week(week: Week) -> Result<(), PoolError> {
    if (1..=MAX_WEEK).contains(&week) {
        Ok(())
    } else {
        Err(PoolError::InvalidInput(format!(
            "Week {} is outside 1..={}",
            week, MAX_WEEK
        )))
    }
}

/// First [`PoolError`] anywhere in an error chain
pub fn find_pool_error(err: &anyhow::Error) -> Option<&PoolError> {
    err.chain().find_map(|cause| cause.downcast_ref::<PoolError>())
}
