use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("publish failed: {0}")]
    PublishFailed(String),
    #[error("flush failed: {0}")]
    FlushFailed(String),
    #[error("timeout")]
    Timeout,
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}
