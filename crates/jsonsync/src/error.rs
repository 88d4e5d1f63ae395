use alloc::string::String;

use thiserror::Error;

/// An error raised while reading or writing a document.
///
/// Every error carries the absolute byte position it was detected at.
/// Structural errors poison the engine that raised them: once one has been
/// returned, every further operation on that reader re-returns it, because
/// the scanning position can no longer be trusted. Semantic errors are scoped
/// to the field being processed and leave the engine usable.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at byte {pos}")]
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) pos: u64,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, pos: u64) -> Self {
        Self { kind, pos }
    }

    /// The error category.
    #[must_use]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Absolute byte offset within the logical document.
    #[must_use]
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Whether this error invalidates the scanning position.
    ///
    /// Fatal errors latch: the engine re-returns them on every subsequent
    /// call instead of attempting to scan further.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.kind.is_fatal()
    }
}

/// Error categories, split into structural (fatal) and semantic
/// (recoverable) groups.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    // Structural. The cursor is lost once any of these is raised.
    #[error("unexpected character '{0}'")]
    UnexpectedCharacter(char),
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("unterminated string")]
    UnterminatedString,
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("comments are not allowed")]
    CommentsForbidden,
    #[error("mismatched closing delimiter '{0}'")]
    MismatchedCloser(char),
    #[error("maximum nesting depth {0} exceeded")]
    DepthLimitExceeded(u32),
    #[error("trailing data after document")]
    TrailingData,
    #[error("malformed number")]
    MalformedNumber,
    #[error("invalid UTF-8 in string")]
    InvalidUtf8,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("object keys must be strings")]
    NonStringKey,
    #[error("i/o failure: {0}")]
    Io(String),

    // Semantic. Reported at the point of use; the engine stays usable.
    #[error("missing field '{0}'")]
    MissingField(String),
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("number does not fit in {0}")]
    NumberOutOfRange(&'static str),
    #[error("reference to undeclared id {0}")]
    DanglingReference(u64),
    #[error("identity id {0} is already bound")]
    IdentityRebound(u64),
    #[error("null is not allowed for this field")]
    UnexpectedNull,
    #[error("invalid base64 payload")]
    InvalidBase64,
    #[error("character '{0}' is not a byte")]
    InvalidByteChar(char),
    #[error("malformed identity declaration")]
    MalformedIdentity,
}

impl ErrorKind {
    pub(crate) fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MissingField(_)
                | Self::TypeMismatch { .. }
                | Self::NumberOutOfRange(_)
                | Self::DanglingReference(_)
                | Self::IdentityRebound(_)
                | Self::UnexpectedNull
                | Self::InvalidBase64
                | Self::InvalidByteChar(_)
                | Self::MalformedIdentity
        )
    }
}

/// Shorthand for results carrying [`Error`].
pub type Result<T> = core::result::Result<T, Error>;
