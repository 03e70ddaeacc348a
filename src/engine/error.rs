use crate::model::Id;

/// Why a mutation was refused. A refused mutation leaves the document and
/// its history exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    NotFound(Id),
    InvalidOperation(&'static str),
    PartySize(usize),
    NothingToUndo,
    NothingToRedo,
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::InvalidOperation(msg) => write!(f, "invalid operation: {msg}"),
            EngineError::PartySize(n) => write!(
                f,
                "party size {n} outside [{}, {}]",
                crate::limits::MIN_PARTY_SIZE,
                crate::limits::MAX_PARTY_SIZE
            ),
            EngineError::NothingToUndo => write!(f, "nothing to undo"),
            EngineError::NothingToRedo => write!(f, "nothing to redo"),
        }
    }
}

impl std::error::Error for EngineError {}
