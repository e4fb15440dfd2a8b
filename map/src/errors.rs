use failure::{Backtrace, Context, Fail};
use std::fmt;
use std::result::Result as StdResult;

pub type Result<T> = StdResult<T, Error>;

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "Corrupt map geometry: {}", 0)]
    CorruptGeometry(String),
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }

    pub(crate) fn bad_vertex_ref(linedef: usize, vertex: i64, num_vertices: usize) -> Self {
        Self::from(ErrorKind::CorruptGeometry(format!(
            "linedef {} references vertex {} of {}",
            linedef, vertex, num_vertices
        )))
    }

    pub(crate) fn bad_sidedef_ref(linedef: usize, sidedef: i64, num_sidedefs: usize) -> Self {
        Self::from(ErrorKind::CorruptGeometry(format!(
            "linedef {} references sidedef {} of {}",
            linedef, sidedef, num_sidedefs
        )))
    }

    pub(crate) fn bad_sector_ref(sidedef: usize, sector: i64, num_sectors: usize) -> Self {
        Self::from(ErrorKind::CorruptGeometry(format!(
            "sidedef {} references sector {} of {}",
            sidedef, sector, num_sectors
        )))
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.inner.fmt(f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::from(Context::new(kind))
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Self {
        Error { inner }
    }
}
