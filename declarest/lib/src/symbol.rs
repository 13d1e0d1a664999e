use std::fmt;

use thiserror::Error;

/// A validated node symbol.
///
/// Symbols name namespaces and endpoints in an API tree and are joined with
/// `.` to address nested nodes (`forecast.daily`).
///
/// Rules:
/// 1. Must start with an alphabetic character.
/// 2. Remaining characters must be alphanumeric or `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    #[error("symbol cannot be empty")]
    Empty,
    #[error("symbol `{0}` must start with an alphabetic character")]
    InvalidStartCharacter(String),
    #[error("symbol `{symbol}` contains invalid character: '{found}'")]
    InvalidCharacter { symbol: String, found: char },
}

impl Symbol {
    /// Creates a new symbol, validating the identifier rules.
    pub fn new<S: Into<String>>(symbol: S) -> Result<Self, SymbolError> {
        let s = symbol.into();
        Self::validate(&s)?;
        Ok(Self(s))
    }

    fn validate(s: &str) -> Result<(), SymbolError> {
        let mut chars = s.chars();

        match chars.next() {
            None => return Err(SymbolError::Empty),
            Some(c) if !c.is_alphabetic() => {
                return Err(SymbolError::InvalidStartCharacter(s.to_string()));
            }
            _ => {}
        }

        if let Some(found) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
            return Err(SymbolError::InvalidCharacter {
                symbol: s.to_string(),
                found,
            });
        }

        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = SymbolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
