/// Everything that can go wrong while coordinating a room. `NotFound` on
/// the room key means the room was closed; callers navigate away rather
/// than retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("room not found")]
    NotFound,
    #[error("the name {0:?} is already taken in this room")]
    NameTaken(String),
    #[error("not a whole number: {0:?}")]
    InvalidAnswer(String),
    #[error("store write failed: {0}")]
    WriteFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
