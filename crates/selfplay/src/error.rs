use thiserror::Error;

#[derive(Error, Debug)]
pub enum SelfPlayError {
    #[error("Board error: {0}")]
    Board(#[from] reversi_core::BoardError),

    #[error(transparent)]
    Model(#[from] anyhow::Error),

    #[error("NN evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("No legal moves available")]
    NoLegalMoves,
}

pub type Result<T> = std::result::Result<T, SelfPlayError>;
