use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Programmer misuse caught before any I/O is attempted, such as a
    /// missing endpoint or transport.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model '{0}' is not registered")]
    UnknownModel(String),

    #[error("Model '{0}' is already registered")]
    DuplicateModel(String),

    /// `find_or_fail`/`first_or_fail` came back empty.
    #[error("Model not found")]
    NotFound,

    /// A "before" lifecycle hook vetoed the operation. Carries the
    /// cancelled phase, e.g. "creating.cancelled".
    #[error("{0}")]
    Cancelled(String),

    /// The server answered with something we cannot hydrate.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Cancellation rejection for the named lifecycle event.
    pub fn cancelled(event: &str) -> Self {
        Error::Cancelled(format!("{event}.cancelled"))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancelled_carries_phase_name() {
        let err = Error::cancelled("creating");
        assert_eq!(err.to_string(), "creating.cancelled");
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_not_found_is_distinct_from_configuration() {
        assert!(Error::NotFound.is_not_found());
        assert!(!Error::Configuration("no endpoint".into()).is_not_found());
    }
}
