//! Application error type.
//!
//! Errors carry a coarse classification so callers can tell a failed download
//! apart from a malformed dataset, plus a stable process exit code:
//!
//! - 2: usage/config problems (bad flags, unwritable paths)
//! - 3: dataset problems (parse failures, empty snapshots)
//! - 4: network/runtime problems (fetch failures, terminal errors)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad flags, missing files, unwritable export paths.
    Usage,
    /// Snapshot rows that cannot be interpreted as dates/numbers.
    Parse,
    /// Transport error or non-success HTTP status during download.
    Fetch,
    /// Everything else (terminal I/O, draw errors).
    Runtime,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Usage => 2,
            ErrorKind::Parse => 3,
            ErrorKind::Fetch | ErrorKind::Runtime => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fetch, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_kind() {
        assert_eq!(AppError::usage("x").exit_code(), 2);
        assert_eq!(AppError::parse("x").exit_code(), 3);
        assert_eq!(AppError::fetch("x").exit_code(), 4);
        assert_eq!(AppError::runtime("x").exit_code(), 4);
    }

    #[test]
    fn kind_is_preserved() {
        assert_eq!(AppError::fetch("boom").kind(), ErrorKind::Fetch);
    }
}
