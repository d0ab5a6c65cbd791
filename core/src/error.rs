use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Row {row} has {found} cells, expected {expected}")]
    ShapeMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("Unknown cell code {0}")]
    InvalidCellCode(i8),
    #[error("View transform is degenerate")]
    DegenerateTransform,
}

pub type Result<T> = core::result::Result<T, GridError>;
