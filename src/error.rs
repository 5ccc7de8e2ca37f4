use openssl::error::ErrorStack;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unix time {0} is before the epoch")]
    InvalidTime(i64),
    #[error("hash is {0} bytes, truncation needs at least 20")]
    HashTooShort(usize),
    #[error("unsupported digit count {0}, expected 6, 7 or 8")]
    UnsupportedDigitCount(u32),
    #[error("time step must be a positive number of seconds")]
    InvalidPeriod,
    #[error("malformed otpauth uri: {0}")]
    MalformedUri(String),
    #[error("otpauth uri has no secret parameter")]
    MissingSecret,
    #[error("invalid value {value:?} for parameter {name}")]
    InvalidParameter { name: &'static str, value: String },
    #[error("invalid secret: {0}")]
    InvalidSecret(String),
    #[error("secure random source unavailable: {0}")]
    EntropyUnavailable(ErrorStack),
    #[error("hmac computation failed: {0}")]
    Hmac(#[from] ErrorStack),
}
