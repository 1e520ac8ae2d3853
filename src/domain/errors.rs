use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Corrupt data: {0}")]
    DataCorrupt(String),
    #[error("Transient failure: {0}")]
    Transient(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_missing_entity() {
        let err = DomainError::not_found("Order ABCD1234");
        assert_eq!(err.to_string(), "Order ABCD1234 not found");
    }

    #[test]
    fn data_corrupt_display() {
        let err = DomainError::DataCorrupt("orders.json: expected value".to_string());
        assert_eq!(err.to_string(), "Corrupt data: orders.json: expected value");
    }
}
