use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoercionError {
    #[error("Coercion error: '{0}' is not a valid amount")]
    InvalidAmount(String),
    #[error("Coercion error: '{0}' is not a valid timestamp")]
    InvalidTimestamp(String)
}
