use std::path::PathBuf;

#[derive(Debug)]
pub enum StoreError {
    /// Reading or writing the file failed
    Io { path: PathBuf, source: std::io::Error },
    /// A line could not be understood
    Malformed { path: PathBuf, line: usize, text: String },
}

impl StoreError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True when the file simply does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            StoreError::Malformed { path, line, text } => {
                write!(f, "{}:{}: malformed record {:?}", path.display(), line, text)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io { source, .. } => Some(source),
            StoreError::Malformed { .. } => None,
        }
    }
}
