use thiserror::Error;

/// Errors raised while lexing, parsing, or evaluating an author script.
///
/// Script faults always propagate to the host: a failing hook or
/// predicate is a story bug and must not be silently swallowed.
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    /// The script is not syntactically valid.
    #[error("script syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset of the error in the script source.
        position: usize,
        /// What went wrong.
        message: String,
    },

    /// A method was called that the story API does not expose.
    #[error("unknown story method: {0}")]
    UnknownMethod(String),

    /// A known method was called with the wrong number of arguments.
    #[error("story.{method} expects {expected} argument(s), found {found}")]
    WrongArity {
        /// The method name.
        method: String,
        /// How many arguments it takes.
        expected: usize,
        /// How many were passed.
        found: usize,
    },

    /// An operation was applied to values of the wrong type.
    #[error("type error: {0}")]
    TypeMismatch(String),

    /// A when-predicate evaluated to something other than a boolean.
    #[error("when-predicate must evaluate to a boolean, found {0}")]
    PredicateNotBoolean(&'static str),
}
