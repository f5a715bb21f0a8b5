//! Error types for container operations.
//!
//! Every failure names the identifier it is about and, where the build
//! stack was active, the chain of consumers that led there.

use std::fmt;

use joinery_support::rendering::{join_chain, render_chain};

use crate::identifier::Identifier;

/// Main error type for all joinery operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Target has no concrete realization.
    #[error("{}", .0)]
    NotInstantiable(NotInstantiableError),

    /// An untyped constructor parameter has no value to receive.
    #[error("{}", .0)]
    UnresolvableDependency(UnresolvableDependencyError),

    /// A type (or alias) needs itself, directly or transitively.
    #[error("{}", .0)]
    CircularDependency(CircularDependencyError),

    /// A resolved instance is not of the requested Rust type.
    #[error("Type mismatch for [{identifier}]: expected {expected}")]
    TypeMismatch {
        identifier: Identifier,
        expected: &'static str,
    },

    /// A constructor asked for an argument its blueprint never declared.
    #[error("Constructor of [{owner}] asked for undeclared parameter [{parameter}]")]
    MissingArgument {
        owner: Identifier,
        parameter: Identifier,
    },

    /// A constructor or factory reported an error of its own.
    #[error("Failed to construct [{identifier}]: {source}")]
    ConstructionFailed {
        identifier: Identifier,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A service provider's registration hook failed.
    #[error("Service provider [{provider}] failed to register: {source}")]
    Provider {
        provider: Identifier,
        #[source]
        source: Box<ContainerError>,
    },
}

impl ContainerError {
    /// Wraps an arbitrary error raised while constructing `identifier`.
    pub fn construction(
        identifier: impl Into<Identifier>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ContainerError::ConstructionFailed {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    /// `true` for errors that a default value must never paper over.
    #[inline]
    pub fn is_circular(&self) -> bool {
        matches!(self, ContainerError::CircularDependency(_))
    }
}

/// Error for a target with no constructible realization: an unknown
/// identifier, or a blueprint declared abstract.
#[derive(Debug)]
pub struct NotInstantiableError {
    pub target: Identifier,
    /// Build stack at the time of failure, outermost first.
    pub chain: Vec<Identifier>,
    /// Known identifiers that look like `target`.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotInstantiableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.chain.is_empty() {
            write!(f, "Target [{}] is not instantiable.", self.target)?;
        } else {
            write!(
                f,
                "Target [{}] is not instantiable while building [{}].",
                self.target,
                join_chain(&self.chain, ", "),
            )?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: bind [{}] to a concrete type or factory, or define a blueprint for it",
            self.target
        )
    }
}

/// Error for an untyped parameter with no explicit value, no contextual
/// override and no default.
#[derive(Debug)]
pub struct UnresolvableDependencyError {
    pub parameter: Identifier,
    /// The type whose constructor declares the parameter.
    pub declaring: Identifier,
}

impl fmt::Display for UnresolvableDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unresolvable dependency resolving [${}] in class [{}]",
            self.parameter, self.declaring,
        )?;
        write!(
            f,
            "\n  Hint: pass it explicitly, give it a default, or use when(\"{}\").needs(\"${}\").give(..)",
            self.declaring, self.parameter,
        )
    }
}

/// Error for a dependency cycle.
///
/// The chain starts and ends with the same identifier.
#[derive(Debug)]
pub struct CircularDependencyError {
    pub chain: Vec<Identifier>,
}

impl fmt::Display for CircularDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular dependency detected:\n  {}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: break the cycle with a factory that resolves one side lazily"
        )
    }
}

/// Convenient Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
