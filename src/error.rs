use std::convert::Infallible;

pub type Result<T> = std::result::Result<T, MarketError>;

#[derive(thiserror::Error, Debug)]
pub enum MarketError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Not authorized: {0}")]
    Forbidden(String),
    #[error("{0} is not available for swap")]
    Unavailable(String),
    #[error("You cannot request your own item")]
    SelfRequest,
    #[error("Not enough points. Have {have}, need {need}")]
    InsufficientPoints { have: u64, need: u64 },
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Failed to mint identifier: {0}")]
    Identifier(String),
    #[error("Storage failure: {0}")]
    Storage(#[from] sled::Error),
    #[error("Failed to decode record: {0}")]
    Decode(#[from] minicbor::decode::Error),
    #[error("Failed to encode record: {0}")]
    Encode(#[from] minicbor::encode::Error<Infallible>),
    #[error("File storage failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Input-shape failures, raised before any record is touched.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{field} cannot be more than {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("Please add at least one image")]
    NoImages,
    #[error("Point value must be at least 1")]
    ZeroPointValue,
    #[error("Points requests cannot offer an item")]
    UnexpectedOfferedItem,
    #[error("Email address {0} is malformed")]
    MalformedEmail(String),
    #[error("Email address {0} is already registered")]
    DuplicateEmail(String),
    #[error("Unsupported image type: {0}")]
    UnsupportedImage(String),
    #[error("File size too large. Max size is {max} bytes")]
    FileTooLarge { max: u64 },
    #[error("Too many files. At most {0} per upload")]
    TooManyFiles(usize),
    #[error("Unknown {what}: {value}")]
    UnknownLabel { what: &'static str, value: String },
    #[error("Balance would overflow")]
    BalanceOverflow,
}

impl MarketError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }
    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }
    /// True for the taxonomy kinds a caller can act on; false for storage and codec faults.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            Self::Storage(_) | Self::Decode(_) | Self::Encode(_) | Self::Io(_) | Self::Identifier(_)
        )
    }
}
