use failchain::{BoxedError, ChainErrorKind};
use failure::Fail;
use std::result::Result as StdResult;

pub type Error = BoxedError<ErrorKind>;
pub type Result<T> = StdResult<T, Error>;

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "Invalid level geometry: {}", 0)]
    InvalidGeometry(String),

    #[fail(display = "Level contains no buildable half-edges.")]
    EmptyMap,
}

impl ChainErrorKind for ErrorKind {
    type Error = Error;
}
