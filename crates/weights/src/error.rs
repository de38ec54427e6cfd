use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeightFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed weight file at block `{block}`: {reason}")]
    Malformed { block: String, reason: String },

    #[error("Weight file does not match the model at block `{block}`: {reason}")]
    Topology { block: String, reason: String },
}

impl WeightFileError {
    pub(crate) fn malformed(block: impl Into<String>, reason: impl Into<String>) -> Self {
        WeightFileError::Malformed {
            block: block.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn topology(block: impl Into<String>, reason: impl Into<String>) -> Self {
        WeightFileError::Topology {
            block: block.into(),
            reason: reason.into(),
        }
    }

    /// Name of the block the error refers to, if any
    pub fn block(&self) -> Option<&str> {
        match self {
            WeightFileError::Io(_) => None,
            WeightFileError::Malformed { block, .. } | WeightFileError::Topology { block, .. } => {
                Some(block)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WeightFileError>;
