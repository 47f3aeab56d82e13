//! Purpose: Structured error type shared by the mapper, client, and CLI.
//! Exports: `Error`, `ErrorKind`, `to_exit_code`.
//! Role: One error surface; decode failures carry path + expected/actual tokens.
//! Invariants: Decode kinds are terminal for the value being decoded.
//! Invariants: Exit code mapping is stable once published.
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    MissingRequiredField,
    UnknownEnumerationValue,
    UnknownDiscriminatorValue,
    InvalidTimestamp,
    MalformedNumber,
    UnexpectedToken,
    Syntax,
    Usage,
    NotFound,
    Remote,
    Io,
    Internal,
}

impl ErrorKind {
    pub fn is_decode(self) -> bool {
        matches!(
            self,
            ErrorKind::MissingRequiredField
                | ErrorKind::UnknownEnumerationValue
                | ErrorKind::UnknownDiscriminatorValue
                | ErrorKind::InvalidTimestamp
                | ErrorKind::MalformedNumber
                | ErrorKind::UnexpectedToken
                | ErrorKind::Syntax
        )
    }
}

#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    hint: Option<String>,
    path: Option<String>,
    expected: Option<String>,
    actual: Option<String>,
    line: Option<usize>,
    column: Option<usize>,
    status: Option<u16>,
    code: Option<String>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            hint: None,
            path: None,
            expected: None,
            actual: None,
            line: None,
            column: None,
            status: None,
            code: None,
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// JSON path of the value that failed to decode, e.g. `$.UpgradeDomains[1].State`.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn expected(&self) -> Option<&str> {
        self.expected.as_deref()
    }

    pub fn actual(&self) -> Option<&str> {
        self.actual.as_deref()
    }

    pub fn line(&self) -> Option<usize> {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<String>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {path})")?;
        }
        if let Some(expected) = &self.expected {
            write!(f, " (expected: {expected})")?;
        }
        if let Some(actual) = &self.actual {
            write!(f, " (actual: {actual})")?;
        }
        if let (Some(line), Some(column)) = (self.line, self.column) {
            write!(f, " (line: {line}, column: {column})")?;
        }
        if let Some(status) = self.status {
            write!(f, " (status: {status})")?;
        }
        if let Some(code) = &self.code {
            write!(f, " (code: {code})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

pub fn to_exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Internal => 1,
        ErrorKind::Usage => 2,
        ErrorKind::NotFound => 3,
        ErrorKind::Remote => 4,
        ErrorKind::Io => 5,
        ErrorKind::Syntax => 6,
        ErrorKind::MissingRequiredField
        | ErrorKind::UnknownEnumerationValue
        | ErrorKind::UnknownDiscriminatorValue
        | ErrorKind::InvalidTimestamp
        | ErrorKind::MalformedNumber
        | ErrorKind::UnexpectedToken => 7,
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, ErrorKind, to_exit_code};

    #[test]
    fn exit_code_mapping_is_stable() {
        let cases = [
            (ErrorKind::Internal, 1),
            (ErrorKind::Usage, 2),
            (ErrorKind::NotFound, 3),
            (ErrorKind::Remote, 4),
            (ErrorKind::Io, 5),
            (ErrorKind::Syntax, 6),
            (ErrorKind::MissingRequiredField, 7),
            (ErrorKind::UnknownDiscriminatorValue, 7),
            (ErrorKind::MalformedNumber, 7),
        ];

        for (kind, code) in cases {
            assert_eq!(to_exit_code(kind), code);
        }
    }

    #[test]
    fn display_includes_decode_context() {
        let err = Error::new(ErrorKind::UnknownEnumerationValue)
            .with_message("unrecognized UpgradeState")
            .with_path("$.UpgradeState")
            .with_expected("one of Invalid, RollingForwardCompleted")
            .with_actual("\"Sideways\"");
        let text = err.to_string();
        assert!(text.starts_with("UnknownEnumerationValue: unrecognized UpgradeState"));
        assert!(text.contains("(path: $.UpgradeState)"));
        assert!(text.contains("(actual: \"Sideways\")"));
    }

    #[test]
    fn decode_kinds_are_classified() {
        assert!(ErrorKind::InvalidTimestamp.is_decode());
        assert!(ErrorKind::Syntax.is_decode());
        assert!(!ErrorKind::Remote.is_decode());
        assert!(!ErrorKind::Io.is_decode());
    }
}
