use thiserror::Error;

/// A tree the generator cannot lower. Only reachable when generation is run
/// on a tree that still carries syntax errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Error placeholder reached at {line}:{column}")]
    ErrorNode { line: u32, column: u32 },
    #[error("Invalid assignment target at {line}:{column}")]
    InvalidTarget { line: u32, column: u32 },
}

pub type GenerateResult<T> = Result<T, GenerateError>;
