//! Request URL construction from a path template and a parameter set.

use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ApiError;
use crate::param::ParamSet;
use crate::uri_template::{UriTemplate, encode_component};

/// Fields of `params` that are not bound by a `{placeholder}` in `template`.
///
/// These become the query string, in resolved declaration order.
pub fn query_fields<'a>(template: &UriTemplate, params: &'a ParamSet) -> Vec<&'a str> {
    let bound: IndexSet<&str> = template.variables().collect();
    let fields: IndexSet<&str> = params
        .all_params()
        .values()
        .map(|p| p.field())
        .filter(|field| !bound.contains(field))
        .collect();
    fields.into_iter().collect()
}

/// Builds the request URL for `values`.
///
/// Parameters whose field appears as a placeholder fill the path; every other
/// supplied parameter is appended as `field=value`, continuing the query
/// string when the expanded template already has one.
///
/// ## Errors
///
/// - [`crate::error::ParamError`] when `values` are rejected by `params`
/// - [`crate::error::ConfigError::InvalidPathTemplate`] when the template
///   does not parse
///
/// ## Examples
///
/// ```
/// use declarest_lib::param::{ParamOptions, ParamSet};
/// use declarest_lib::url_builder::build_url;
/// use serde_json::json;
///
/// let mut params = ParamSet::new("search");
/// params.add("q", ParamOptions::new()).unwrap();
///
/// let values = json!({"q": "New York"});
/// let url = build_url("/search?format=json", &params, values.as_object().unwrap()).unwrap();
/// assert_eq!(url, "/search?format=json&q=New%20York");
/// ```
pub fn build_url(
    template: &str,
    params: &ParamSet,
    values: &Map<String, Value>,
) -> Result<String, ApiError> {
    let parsed = UriTemplate::parse(template)?;
    let formatted = params.process_input(values)?;

    let pairs: Vec<String> = query_fields(&parsed, params)
        .into_iter()
        .filter_map(|field| {
            formatted
                .get(field)
                .map(|value| format!("{}={}", encode_component(field), encode_component(value)))
        })
        .collect();

    let mut url = normalize(&parsed.expand(&formatted));
    if !pairs.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&pairs.join("&"));
    }

    debug!(template, url = %url, "built request URL");
    Ok(url)
}

/// Restores encoded slashes in the path portion and drops an empty query.
fn normalize(expanded: &str) -> String {
    let (path, query) = match expanded.split_once('?') {
        Some((path, query)) => (path, Some(query.trim_end_matches('&'))),
        None => (expanded, None),
    };

    let path = path.replace("%2F", "/").replace("%2f", "/");
    match query {
        Some(query) if !query.is_empty() => format!("{path}?{query}"),
        _ => path,
    }
}
