use serde::Serialize;
use thiserror::Error;

/// Closed error type for the node core. Every variant maps to exactly one
/// HTTP status and one machine-readable `kind` string at the HTTP boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("seed does not re-derive sender address")]
    Unauthorized,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("mempool is full")]
    MempoolFull,

    #[error("transaction already pending")]
    DuplicateTx,

    #[error("submitted index is not last.index + 1")]
    InvalidIndex,

    #[error("submitted prev_hash does not match last block's hash")]
    InvalidPrevHash,

    #[error("submitted timestamp is not greater than last block's timestamp")]
    InvalidTimestamp,

    #[error("proof does not satisfy required difficulty {required} (multiplier {multiplier})")]
    LowDifficulty { required: u32, multiplier: f64 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(String),
}

impl NodeError {
    /// The HTTP status code this error maps to at the boundary (§7).
    pub fn status_code(&self) -> u16 {
        match self {
            NodeError::MempoolFull => 503,
            NodeError::NotFound(_) => 404,
            NodeError::Io(_) => 500,
            _ => 400,
        }
    }

    /// Machine-readable variant name, stable across releases.
    pub fn kind(&self) -> &'static str {
        match self {
            NodeError::InvalidAddress(_) => "InvalidAddress",
            NodeError::Unauthorized => "Unauthorized",
            NodeError::InsufficientFunds => "InsufficientFunds",
            NodeError::MempoolFull => "MempoolFull",
            NodeError::DuplicateTx => "DuplicateTx",
            NodeError::InvalidIndex => "InvalidIndex",
            NodeError::InvalidPrevHash => "InvalidPrevHash",
            NodeError::InvalidTimestamp => "InvalidTimestamp",
            NodeError::LowDifficulty { .. } => "LowDifficulty",
            NodeError::NotFound(_) => "NotFound",
            NodeError::Io(_) => "Io",
        }
    }
}

impl From<std::io::Error> for NodeError {
    fn from(e: std::io::Error) -> Self {
        NodeError::Io(e.to_string())
    }
}

/// JSON error envelope returned by the HTTP boundary.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: bool,
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_difficulty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty_multiplier: Option<f64>,
}

impl From<&NodeError> for ErrorBody {
    fn from(e: &NodeError) -> Self {
        let (required_difficulty, difficulty_multiplier) = match e {
            NodeError::LowDifficulty {
                required,
                multiplier,
            } => (Some(*required), Some(*multiplier)),
            _ => (None, None),
        };
        ErrorBody {
            status: false,
            error: e.to_string(),
            kind: e.kind(),
            required_difficulty,
            difficulty_multiplier,
        }
    }
}
