//! API tree configuration errors.

use thiserror::Error;

use crate::symbol::SymbolError;

/// Errors in the declared API tree.
///
/// These occur while assembling the tree with `build()`, or when a lookup
/// names a node that does not exist, and indicate programmer errors rather
/// than bad caller input.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Node symbol validation failed.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(#[from] SymbolError),

    /// Path template contains invalid expression syntax.
    #[error("Invalid path template `{template}`: {message}")]
    InvalidPathTemplate {
        /// The offending template.
        template: String,
        /// Description of the problem.
        message: String,
    },

    /// Two children of the same namespace share a symbol.
    #[error("Duplicate child `{symbol}` in `{parent}`")]
    DuplicateChild {
        /// The namespace declaring the children.
        parent: String,
        /// The duplicated symbol.
        symbol: String,
    },

    /// A node re-declares a parameter it already inherits.
    #[error("Parameter `{name}` on `{node}` is already declared by an ancestor")]
    ParamRedeclared {
        /// The node path re-declaring the parameter.
        node: String,
        /// The parameter name.
        name: String,
    },

    /// An endpoint was declared with child nodes.
    #[error("Endpoint `{symbol}` cannot have children")]
    EndpointWithChildren {
        /// The endpoint symbol.
        symbol: String,
    },

    /// A default header name or value is not valid HTTP.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// No node exists at the requested path.
    #[error("Unknown node: {path}")]
    UnknownNode {
        /// The dotted symbol path that was looked up.
        path: String,
    },
}

impl ConfigError {
    /// Creates an invalid path template error.
    pub fn invalid_template(template: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPathTemplate {
            template: template.into(),
            message: message.into(),
        }
    }
}
