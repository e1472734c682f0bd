//! Root causes that callers may want to tell apart.
//!
//! Operations return `anyhow::Result`; when one of these is the cause it can be
//! recovered with `err.downcast_ref::<SleepError>()`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SleepError {
    #[error("sleep database unavailable: {0}")]
    StorageUnavailable(String),

    #[error("sleep night {0} not found")]
    RecordNotFound(i64),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("sleep quality {0} is outside the 0..=5 range")]
    InvalidQuality(i32),

    #[error("sleep tracker has shut down")]
    Cancelled,
}

impl SleepError {
    /// Finds a `SleepError` anywhere in an error's chain.
    pub fn find(err: &anyhow::Error) -> Option<&SleepError> {
        err.chain().find_map(|cause| cause.downcast_ref::<SleepError>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn find_sees_through_context() {
        let err = Err::<(), _>(SleepError::RecordNotFound(7))
            .context("failed to update night")
            .unwrap_err();

        assert!(matches!(
            SleepError::find(&err),
            Some(SleepError::RecordNotFound(7))
        ));
    }

    #[test]
    fn find_ignores_unrelated_errors() {
        let err = anyhow::anyhow!("disk on fire");
        assert!(SleepError::find(&err).is_none());
    }
}
