use crate::storage::NodeIndex;

#[derive(Debug, thiserror::Error)]
pub enum OutlineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Syntax error near byte {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeIndex),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl OutlineError {
    /// Builds a syntax error anchored at a byte offset of the query.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Returns the byte offset for syntax errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Shifts a syntax error position by `offset`, used when a sub-filter is
    /// parsed out of a larger query.
    pub(crate) fn offset_by(self, offset: usize) -> Self {
        match self {
            Self::Syntax { position, message } => Self::Syntax {
                position: position + offset,
                message,
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, OutlineError>;
