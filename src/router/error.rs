use std::fmt;

/// Route registration error
///
/// Returned by [`MatchTree::register`](super::MatchTree::register) and the layers
/// above it when a pattern cannot be compiled. Registration fails before any node
/// is created, so the tree is unchanged when this is returned.
#[derive(Debug, Clone)]
pub enum RouteError {
    /// A `(...)` segment did not compile as a regular expression
    InvalidConstraint {
        /// The full pattern being registered
        pattern: String,
        /// The offending `/`-delimited segment
        fragment: String,
        /// The underlying regex compilation error
        source: regex::Error,
    },
    /// An unconstrained optional parameter is followed by a required
    /// parameter, so the form without the optional could never be reached
    ShadowedOptional {
        /// The full pattern being registered
        pattern: String,
        /// The optional segment
        fragment: String,
    },
    /// The HTTP method was empty after trimming
    EmptyMethod {
        /// The pattern the method was supplied for
        pattern: String,
    },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::InvalidConstraint {
                pattern,
                fragment,
                source,
            } => {
                write!(
                    f,
                    "route pattern '{}': segment '{}' is not a valid constraint: {}",
                    pattern, fragment, source
                )
            }
            RouteError::ShadowedOptional { pattern, fragment } => {
                write!(
                    f,
                    "route pattern '{}': optional segment '{}' would capture the parameter after it; constrain it or register both forms",
                    pattern, fragment
                )
            }
            RouteError::EmptyMethod { pattern } => {
                write!(
                    f,
                    "route pattern '{}': an HTTP method name is required",
                    pattern
                )
            }
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::InvalidConstraint { source, .. } => Some(source),
            RouteError::ShadowedOptional { .. } | RouteError::EmptyMethod { .. } => None,
        }
    }
}
