use thiserror::Error;

/// Connection-class failures. Any of these terminates the pipeline.
#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),
    #[error("read failed: {0}")]
    ReadFailed(String),
    #[error("disconnected: {0}")]
    Disconnected(String),
    #[error("pipeline already terminated")]
    Terminated,
}

/// Record-class publish failure. Logged and skipped by the pipeline.
#[derive(Error, Debug)]
pub enum WriterError {
    #[error("write failed: {0}")]
    WriteFailed(String),
}

/// Record-class decode failure. Logged and skipped by the pipeline.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("malformed {message_type} payload: {source}")]
    Payload {
        message_type: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{message_type} envelope has no payload")]
    MissingPayload { message_type: String },
    #[error("feed rejected request: {0}")]
    Rejected(String),
}
