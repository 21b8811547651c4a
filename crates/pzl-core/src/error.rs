use thiserror::Error;

pub type PzlResult<T> = Result<T, PzlError>;

#[derive(Debug, Error)]
pub enum PzlError {
    #[error("the question/answer list must have odd length (got {0})")]
    InvalidChainLength(usize),

    #[error("config error: {0}")]
    Config(String),

    #[error("malformed artifact: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
