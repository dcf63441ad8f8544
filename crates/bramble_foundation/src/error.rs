//! Error types for the Bramble system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Compile-time kinds abort compilation; runtime kinds are story bugs
//! surfaced to the host loop.

use std::fmt;

use thiserror::Error;

use crate::types::ValueType;

/// The main error type for Bramble operations.
#[derive(Debug, Error)]
#[error("{kind}{}", context_suffix(.context.as_ref()))]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

fn context_suffix(context: Option<&ErrorContext>) -> String {
    match context {
        Some(ctx) if ctx.line.is_some() || ctx.source.is_some() => format!(" ({ctx})"),
        _ => String::new(),
    }
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a line/column position, keeping any existing context.
    #[must_use]
    pub fn at(mut self, line: u32, column: u32) -> Self {
        let ctx = self.context.take().unwrap_or_default();
        self.context = Some(ctx.with_position(line as usize, column as usize));
        self
    }

    /// Creates an undeclared variable error.
    #[must_use]
    pub fn undeclared_variable(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndeclaredVariable(name.into()))
    }

    /// Creates an unknown object parent error.
    #[must_use]
    pub fn unknown_object_parent(object: impl Into<String>, parent: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownObjectParent {
            object: object.into(),
            parent: parent.into(),
        })
    }

    /// Creates a type mismatch error.
    #[must_use]
    pub fn type_mismatch(expected: ValueType, actual: ValueType) -> Self {
        Self::new(ErrorKind::TypeMismatch { expected, actual })
    }

    /// Creates an arity mismatch error.
    #[must_use]
    pub fn arity_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(ErrorKind::ArityMismatch { expected, actual })
    }

    /// Creates an unimplemented abstract method error.
    #[must_use]
    pub fn unimplemented_abstract(method: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnimplementedAbstractMethod(method.into()))
    }

    /// Creates a malformed parse tree error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedParseTree(message.into()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Returns true if this error is raised while compiling a story.
    #[must_use]
    pub const fn is_compile_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ParseError { .. }
                | ErrorKind::MalformedParseTree(_)
                | ErrorKind::UnknownObjectParent { .. }
                | ErrorKind::UndeclaredVariable(_)
                | ErrorKind::NotAnLValue(_)
                | ErrorKind::InvalidDefinitionTarget(_)
                | ErrorKind::HandlerWithoutIdentity
        )
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Parse error in story source.
    #[error("parse error at {line}:{column}: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// The parse tree handed to the translator does not have the expected shape.
    #[error("malformed parse tree: {0}")]
    MalformedParseTree(String),

    /// An object definition names a parent that is not a known object.
    #[error("object '{object}' inherits from unknown object '{parent}'")]
    UnknownObjectParent {
        /// The object being defined.
        object: String,
        /// The parent name that failed to resolve.
        parent: String,
    },

    /// Reference to a name with no entry in any enclosing frame.
    #[error("undeclared variable: {0}")]
    UndeclaredVariable(String),

    /// Assignment target is not a variable, member access, or array access.
    #[error("not an assignable expression: {0}")]
    NotAnLValue(String),

    /// Definition target is neither a bare name nor a member access.
    #[error("invalid definition target: {0}")]
    InvalidDefinitionTarget(String),

    /// An `on` handler appears where no enclosing object has a `name`.
    #[error("event handler declared outside an object with a name")]
    HandlerWithoutIdentity,

    /// An abstract function was invoked without being overridden.
    #[error("unimplemented abstract method: {0}")]
    UnimplementedAbstractMethod(String),

    /// An object was accessed while its own initializer was still running.
    #[error("object '{0}' was accessed while it was being initialized")]
    ReentrantInitialization(String),

    /// An object whose initializer already failed was accessed again.
    #[error("object '{0}' failed to initialize")]
    InitializationFailed(String),

    /// Member lookup failed on an object and all of its ancestors.
    #[error("object '{object}' has no member '{member}'")]
    UnknownMember {
        /// Name tag of the receiver object.
        object: String,
        /// The member that was requested.
        member: String,
    },

    /// Type mismatch during runtime type checking.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// The expected type.
        expected: ValueType,
        /// The actual type encountered.
        actual: ValueType,
    },

    /// Wrong number of arguments to function.
    #[error("arity mismatch: expected {expected}, got {actual}")]
    ArityMismatch {
        /// Number of declared parameters.
        expected: usize,
        /// Actual number of arguments.
        actual: usize,
    },

    /// Index out of bounds.
    #[error("index out of bounds: {index} (length {length})")]
    IndexOutOfBounds {
        /// The index that was accessed.
        index: i64,
        /// The actual length of the array.
        length: usize,
    },

    /// The story never assigned an object to `startingRoom`.
    #[error("the story does not define a starting room")]
    NoStartingRoom,

    /// `input` was called before `start`.
    #[error("the story has not been started")]
    NotStarted,

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Module serialization or deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// Source file name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
    /// Stack of function/object frames active when the error was raised.
    pub stack: Vec<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: None,
            line: None,
            column: None,
            stack: Vec::new(),
        }
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }

    /// Adds a stack frame.
    #[must_use]
    pub fn with_frame(mut self, frame: impl Into<String>) -> Self {
        self.stack.push(frame.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.source, self.line, self.column) {
            (Some(source), Some(line), Some(col)) => write!(f, "at {source}:{line}:{col}")?,
            (Some(source), _, _) => write!(f, "at {source}")?,
            (None, Some(line), Some(col)) => write!(f, "at {line}:{col}")?,
            _ => {}
        }
        for frame in &self.stack {
            write!(f, "\n  in {frame}")?;
        }
        Ok(())
    }
}
