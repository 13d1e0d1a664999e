//! Path template parsing and expansion.
//!
//! Supports the subset of RFC 6570 the engine needs:
//!
//! | Expression | Expansion |
//! |------------|-----------|
//! | `{var}` | value, unreserved characters only |
//! | `{+var}` | value, reserved characters kept |
//! | `{?a,b}` | `?a=..&b=..` |
//! | `{&a,b}` | `&a=..&b=..` |
//!
//! Undefined variables expand to nothing. Value modifiers (`:3`, `*`) and the
//! remaining operators are rejected at parse time.

use std::fmt;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::ConfigError;

/// Everything except RFC 3986 unreserved characters.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Everything except unreserved and reserved characters.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Query,
    QueryContinuation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Expression { op: Operator, vars: Vec<String> },
}

/// A parsed path template.
///
/// ## Examples
///
/// ```
/// use declarest_lib::uri_template::UriTemplate;
/// use indexmap::IndexMap;
///
/// let template = UriTemplate::parse("/cities/{id}{?units}").unwrap();
/// assert_eq!(template.variables().collect::<Vec<_>>(), vec!["id", "units"]);
///
/// let mut values = IndexMap::new();
/// values.insert("id".to_string(), "New York".to_string());
/// assert_eq!(template.expand(&values), "/cities/New%20York");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    source: String,
    parts: Vec<Part>,
}

impl UriTemplate {
    /// Parses `template`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidPathTemplate`] for unbalanced braces,
    /// empty expressions, unsupported operators or modifiers, and invalid
    /// variable names.
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let mut parts = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    parts.push(Part::Literal(rest.to_string()));
                    break;
                }
                Some(pos) if rest.as_bytes()[pos] == b'}' => {
                    return Err(ConfigError::invalid_template(template, "unmatched `}`"));
                }
                Some(pos) => {
                    if pos > 0 {
                        parts.push(Part::Literal(rest[..pos].to_string()));
                    }
                    let after = &rest[pos + 1..];
                    let end = after.find('}').ok_or_else(|| {
                        ConfigError::invalid_template(template, "unclosed expression")
                    })?;
                    parts.push(parse_expression(template, &after[..end])?);
                    rest = &after[end + 1..];
                }
            }
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Variable names in order of appearance.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Expression { vars, .. } => Some(vars),
                Part::Literal(_) => None,
            })
            .flatten()
            .map(String::as_str)
    }

    /// Variables of `{var}` and `{+var}` expressions, which fill the path.
    pub fn path_variables(&self) -> impl Iterator<Item = &str> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Expression {
                    op: Operator::Simple | Operator::Reserved,
                    vars,
                } => Some(vars),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
    }

    /// Substitutes `values`, percent-encoding them per operator.
    pub fn expand(&self, values: &IndexMap<String, String>) -> String {
        let mut out = String::with_capacity(self.source.len());

        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Expression { op, vars } => {
                    let defined = vars
                        .iter()
                        .filter_map(|name| values.get(name).map(|v| (name, v)));
                    match op {
                        Operator::Simple | Operator::Reserved => {
                            let set = if *op == Operator::Simple { UNRESERVED } else { RESERVED };
                            let joined: Vec<String> = defined
                                .map(|(_, v)| utf8_percent_encode(v, set).to_string())
                                .collect();
                            out.push_str(&joined.join(","));
                        }
                        Operator::Query | Operator::QueryContinuation => {
                            let mut first = *op == Operator::Query;
                            for (name, value) in defined {
                                out.push(if first { '?' } else { '&' });
                                first = false;
                                out.push_str(name);
                                out.push('=');
                                out.extend(utf8_percent_encode(value, UNRESERVED));
                            }
                        }
                    }
                }
            }
        }

        out
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_expression(template: &str, body: &str) -> Result<Part, ConfigError> {
    let (op, list) = match body.chars().next() {
        None => return Err(ConfigError::invalid_template(template, "empty expression")),
        Some('+') => (Operator::Reserved, &body[1..]),
        Some('?') => (Operator::Query, &body[1..]),
        Some('&') => (Operator::QueryContinuation, &body[1..]),
        Some(c @ ('#' | '.' | '/' | ';' | '=' | ',' | '!' | '@' | '|')) => {
            return Err(ConfigError::invalid_template(
                template,
                format!("unsupported operator `{c}`"),
            ));
        }
        Some(_) => (Operator::Simple, body),
    };

    let vars = list
        .split(',')
        .map(|name| validate_var(template, name).map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Part::Expression { op, vars })
}

fn validate_var<'a>(template: &str, name: &'a str) -> Result<&'a str, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::invalid_template(template, "empty variable name"));
    }
    if name.ends_with('*') || name.contains(':') {
        return Err(ConfigError::invalid_template(
            template,
            format!("unsupported modifier on `{name}`"),
        ));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '.')
    {
        return Err(ConfigError::invalid_template(
            template,
            format!("invalid character '{c}' in variable `{name}`"),
        ));
    }
    Ok(name)
}

/// Percent-encodes everything but RFC 3986 unreserved characters.
pub(crate) fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Names of the path `{placeholder}` variables in `template`.
///
/// Variables of `{?..}` and `{&..}` expressions are query parameters and are
/// not listed.
///
/// ## Errors
///
/// Returns [`ConfigError::InvalidPathTemplate`] when the template does not
/// parse.
pub fn placeholders(template: &str) -> Result<Vec<String>, ConfigError> {
    Ok(UriTemplate::parse(template)?
        .path_variables()
        .map(str::to_string)
        .collect())
}
