use std::path::PathBuf;

use quick_error::quick_error;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        /// A configuration value or argument is out of range.
        InvalidArgument(msg: String) {
            display("invalid argument: {}", msg)
        }
        /// A required asset, such as the label font, could not be loaded.
        ResourceUnavailable(path: PathBuf, reason: String) {
            display("resource {} unavailable: {}", path.display(), reason)
        }
        /// The scannable code or a raster for one identifier could not be produced.
        Encoding(id: String, reason: String) {
            display("could not encode {}: {}", id, reason)
        }
        Io(context: String, err: std::io::Error) {
            display("{}: {}", context, err)
            source(err)
        }
    }
}

/// Coarse classification of [`Error`], for callers that only need to branch on the kind.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    InvalidArgument,
    ResourceUnavailable,
    Encoding,
    Io,
}

impl Error {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn io(context: impl Into<String>, err: std::io::Error) -> Self {
        Error::Io(context.into(), err)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument(..) => ErrorKind::InvalidArgument,
            Error::ResourceUnavailable(..) => ErrorKind::ResourceUnavailable,
            Error::Encoding(..) => ErrorKind::Encoding,
            Error::Io(..) => ErrorKind::Io,
        }
    }
}

#[test]
fn io_errors_keep_their_source() {
    use std::error::Error as _;

    let err = Error::io(
        "writing b000001.png",
        std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    );

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("writing b000001.png: "));
}
