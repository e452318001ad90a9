use thiserror::Error;

/// Rejections of a malformed calculation request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid principal: must be greater than zero")]
    InvalidPrincipal,
    #[error("end date must be after start date")]
    EndNotAfterStart,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no quotations found for requested period")]
    DataUnavailable,

    #[error("updated value exceeds the supported decimal range")]
    Overflow,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything the calculator service can fail with.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Calculation(err.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}
