use thiserror::Error;

use crate::codec::CodecError;
use crate::model::{ProgressError, WordError};
use crate::session::SessionError;

/// Convenience aggregate over the crate's error types.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}
