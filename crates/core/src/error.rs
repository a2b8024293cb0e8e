use std::io;
use std::path::PathBuf;

/// Failures a check can run into before it reaches a verdict.
///
/// Checks never return this; they fold it into an UNKNOWN response.
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    #[error("{} does not exist", path.display())]
    NotFound { path: PathBuf },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("could not resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("Unknown hive {0} specified.")]
    UnknownHive(String),
    #[error("{0}")]
    InvalidRegistryKey(String),
    #[error("{0}")]
    Unsupported(&'static str),
}

impl CheckError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        CheckError::Io {
            context: context.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_path() {
        let e = CheckError::NotFound {
            path: PathBuf::from("/nope/here"),
        };
        assert_eq!(e.to_string(), "/nope/here does not exist");
    }

    #[test]
    fn io_keeps_context_and_cause() {
        let e = CheckError::io(
            "open /x",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(e.to_string(), "open /x: denied");
    }
}
