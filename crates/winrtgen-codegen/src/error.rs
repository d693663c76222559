use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("code generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("format error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("internal error: {0}")]
    Internal(String),
}
