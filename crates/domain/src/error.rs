use thiserror::Error;

/// Domain-level errors
///
/// Every application operation surfaces exactly one of these to its caller.
/// `Unauthorized` covers both "not yours" and "does not exist"
/// for device-scoped writes so that non-owners learn nothing about a device.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// First failing item of a rejected batch (zero-based index)
    #[error("Item {index}: {reason}")]
    BatchItemRejected {
        index: usize,
        reason: Box<DomainError>,
    },
}

impl DomainError {
    pub fn batch_item(index: usize, reason: DomainError) -> Self {
        Self::BatchItemRejected {
            index,
            reason: Box::new(reason),
        }
    }

    /// The error that decides how this failure is reported.
    ///
    /// For batch rejections this is the reason of the offending item,
    /// for everything else the error itself.
    pub fn root(&self) -> &DomainError {
        match self {
            Self::BatchItemRejected { reason, .. } => reason.root(),
            other => other,
        }
    }

    pub fn is_store_failure(&self) -> bool {
        matches!(self.root(), Self::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_item_display_carries_index() {
        let err = DomainError::batch_item(3, DomainError::InvalidInput("sensor_type".into()));
        assert_eq!(err.to_string(), "Item 3: Invalid input: sensor_type");
    }

    #[test]
    fn test_root_unwraps_batch_reason() {
        let err = DomainError::batch_item(0, DomainError::Unauthorized("device 7".into()));
        assert_eq!(err.root(), &DomainError::Unauthorized("device 7".into()));

        let plain = DomainError::NotFound("action 1".into());
        assert_eq!(plain.root(), &plain);
    }

    #[test]
    fn test_is_store_failure() {
        assert!(DomainError::StoreUnavailable("pool timed out".into()).is_store_failure());
        assert!(!DomainError::Conflict("mac".into()).is_store_failure());
    }
}
