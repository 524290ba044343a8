use thiserror::Error;

/// The main error type for GNS3 IOU operations.
///
/// This enum represents all possible errors that can occur while talking to
/// a GNS3 controller or managing an IOU device: transport failures, errors
/// reported by the controller itself, validation failures and configuration
/// problems.
#[derive(Error, Debug)]
pub enum Gns3Error {
    /// Represents errors that occur while reaching the controller
    ///
    /// # Fields
    /// * `0` - A description of what went wrong during the exchange
    #[error("Connection error: {0}")]
    Connection(String),

    /// Represents an error reported by the controller for a request
    ///
    /// # Fields
    /// * `status` - The HTTP status code returned by the controller
    /// * `message` - The message extracted from the controller response
    #[error("Controller error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Represents validation failures with detailed context
    ///
    /// # Fields
    /// * `0` - The underlying validation error
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Represents an invalid or unreadable configuration
    ///
    /// # Fields
    /// * `0` - A description of the configuration problem
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Specialized error type for validation failures.
///
/// This enum provides detailed context about why a validation
/// failed, including field-specific errors and format violations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Represents a validation failure for a specific field
    ///
    /// # Fields
    /// * `field` - The name of the field that failed validation
    /// * `message` - A detailed message about why validation failed
    #[error("Field '{field}' validation failed: {message}")]
    Field { field: String, message: String },

    /// Represents format/syntax validation failures
    ///
    /// # Fields
    /// * `0` - Description of the format violation
    #[error("Format error: {0}")]
    Format(String),

    /// Represents violations of domain constraints
    ///
    /// # Fields
    /// * `0` - Description of the constraint violation
    #[error("Domain constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Type alias for Results that may fail with a Gns3Error
pub type Gns3Result<T> = Result<T, Gns3Error>;
