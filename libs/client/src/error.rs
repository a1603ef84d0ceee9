use connect_core::SequenceId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Dial failed: {0}")]
    Dial(#[source] connect_fabric::Error),

    #[error("Not connected")]
    NotConnected,

    #[error("IO error: {0}")]
    Io(#[source] connect_fabric::Error),

    #[error("Sequence ids exhausted for this connection")]
    SequenceExhausted,

    #[error("Sequence id {0} already has a pending request")]
    DuplicateSequence(SequenceId),

    #[error("Request callback dropped without a result")]
    Canceled,
}

pub type Result<T> = std::result::Result<T, Error>;
