//! API tree assembly and lookup.
//!
//! An API is declared as a tree of [`NodeBuilder`]s and assembled once with
//! [`ApiBuilder::build`]. Assembly resolves every node's path template,
//! links each node's parameter set, transform pipeline and decoder to its
//! parent's, and indexes the nodes by dotted symbol path. The resulting
//! [`Api`] is immutable and can be shared across threads.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum::Display;
use tracing::debug;

use crate::error::{ApiError, ConfigError};
use crate::param::{ParamOptions, ParamSet, Redeclaration};
use crate::response::{
    BodyFormat, Decoder, JsonDecoder, Processor, RawResponse, ResponseValue, TransformPipeline,
    process_response,
};
use crate::symbol::Symbol;
use crate::uri_template::{UriTemplate, placeholders};
use crate::url_builder::build_url;

/// Whether a node groups other nodes or is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    Namespace,
    Endpoint,
}

/// Declaration of one node of an API tree.
///
/// ## Examples
///
/// ```
/// use declarest_lib::node::NodeBuilder;
/// use declarest_lib::param::{ParamOptions, ValueKind};
///
/// let forecast = NodeBuilder::namespace("forecast")
///     .param("units", ParamOptions::new().default_value("metric"))
///     .child(
///         NodeBuilder::endpoint("daily")
///             .path("/daily/{city_id}")
///             .param("cnt", ParamOptions::new().param_type(ValueKind::Integer)),
///     );
/// ```
#[derive(Debug)]
pub struct NodeBuilder {
    kind: NodeKind,
    symbol: String,
    path: Option<String>,
    description: Option<String>,
    params: Vec<(String, ParamOptions)>,
    processors: Vec<Processor>,
    decoder: Option<Arc<dyn Decoder>>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    fn new(kind: NodeKind, symbol: impl Into<String>) -> Self {
        Self {
            kind,
            symbol: symbol.into(),
            path: None,
            description: None,
            params: Vec::new(),
            processors: Vec::new(),
            decoder: None,
            children: Vec::new(),
        }
    }

    pub fn namespace(symbol: impl Into<String>) -> Self {
        Self::new(NodeKind::Namespace, symbol)
    }

    pub fn endpoint(symbol: impl Into<String>) -> Self {
        Self::new(NodeKind::Endpoint, symbol)
    }

    /// Sets the path fragment appended to the parent's path.
    ///
    /// Defaults to `/<symbol>`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Declares a parameter. Repeating a name merges the options.
    pub fn param(mut self, name: impl Into<String>, options: ParamOptions) -> Self {
        self.params.push((name.into(), options));
        self
    }

    /// Appends a response processor; runs after every ancestor's.
    pub fn processor(mut self, processor: Processor) -> Self {
        self.processors.push(processor);
        self
    }

    /// Sets the body decoder for this node and its descendants.
    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Shorthand for [`NodeBuilder::decoder`] with a built-in format.
    pub fn format(self, format: BodyFormat) -> Self {
        self.decoder(format.decoder())
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.children.push(child);
        self
    }
}

/// An assembled node.
#[derive(Debug)]
pub struct Node {
    kind: NodeKind,
    symbol: Symbol,
    key: String,
    path: String,
    description: Option<String>,
    params: Arc<ParamSet>,
    pipeline: Arc<TransformPipeline>,
    decoder: Arc<dyn Decoder>,
    children: IndexMap<String, Arc<Node>>,
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Dotted symbol path from the root (empty for the root itself).
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Resolved path template: every ancestor's fragment followed by this
    /// node's.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn params(&self) -> &ParamSet {
        &self.params
    }

    pub fn pipeline(&self) -> &TransformPipeline {
        &self.pipeline
    }

    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    pub fn child(&self, symbol: &str) -> Option<&Arc<Node>> {
        self.children.get(symbol)
    }

    /// Children in declaration order.
    pub fn children(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.children.values()
    }

    /// Builds the request URL for `values`; see [`build_url`].
    pub fn build_url(&self, values: &Map<String, Value>) -> Result<String, ApiError> {
        build_url(&self.path, &self.params, values)
    }

    /// Classifies, decodes and normalizes `raw`; see [`process_response`].
    pub fn process_response(&self, raw: &RawResponse) -> Result<ResponseValue, ApiError> {
        process_response(raw, self.decoder.as_ref(), &self.pipeline)
    }
}

/// An assembled, immutable API tree with a lookup table by dotted path.
///
/// ## Examples
///
/// ```
/// use declarest_lib::node::{Api, NodeBuilder};
/// use declarest_lib::param::ParamOptions;
/// use serde_json::json;
///
/// let api = Api::builder("weather", "https://api.example.com/data/2.5")
///     .param("appid", ParamOptions::new().required())
///     .child(
///         NodeBuilder::namespace("current")
///             .child(NodeBuilder::endpoint("city").path("/weather").param("q", ParamOptions::new())),
///     )
///     .build()
///     .unwrap();
///
/// let values = json!({"appid": "KEY", "q": "Kyiv"});
/// let url = api.build_url("current.city", values.as_object().unwrap()).unwrap();
/// assert_eq!(url, "https://api.example.com/data/2.5/current/weather?appid=KEY&q=Kyiv");
/// ```
#[derive(Debug, Clone)]
pub struct Api {
    root: Arc<Node>,
    index: HashMap<String, Arc<Node>>,
}

impl Api {
    /// Starts declaring an API named `symbol` rooted at `base_url`.
    pub fn builder(symbol: impl Into<String>, base_url: impl Into<String>) -> ApiBuilder {
        ApiBuilder {
            root: NodeBuilder::namespace(symbol).path(base_url),
            redeclaration: Redeclaration::default(),
        }
    }

    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    /// Looks up a node by dotted symbol path; `""` is the root.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownNode`] when no node has that path.
    pub fn node(&self, path: &str) -> Result<&Arc<Node>, ConfigError> {
        self.index.get(path).ok_or_else(|| ConfigError::UnknownNode {
            path: path.to_string(),
        })
    }

    /// Every endpoint, keyed by dotted path, in no particular order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.index
            .values()
            .filter(|node| node.kind == NodeKind::Endpoint)
    }

    /// Builds the request URL of the node at `path`.
    pub fn build_url(&self, path: &str, values: &Map<String, Value>) -> Result<String, ApiError> {
        self.node(path)?.build_url(values)
    }

    /// Processes a raw response for the node at `path`.
    pub fn process_response(
        &self,
        path: &str,
        raw: &RawResponse,
    ) -> Result<ResponseValue, ApiError> {
        self.node(path)?.process_response(raw)
    }
}

/// Builder for [`Api`]; declarations on it apply to the root node.
#[derive(Debug)]
pub struct ApiBuilder {
    root: NodeBuilder,
    redeclaration: Redeclaration,
}

impl ApiBuilder {
    /// Policy for parameters re-declared below an ancestor that already
    /// declares them. Defaults to [`Redeclaration::Reject`].
    pub fn redeclaration(mut self, policy: Redeclaration) -> Self {
        self.redeclaration = policy;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.root = self.root.description(description);
        self
    }

    pub fn param(mut self, name: impl Into<String>, options: ParamOptions) -> Self {
        self.root = self.root.param(name, options);
        self
    }

    pub fn processor(mut self, processor: Processor) -> Self {
        self.root = self.root.processor(processor);
        self
    }

    pub fn decoder(mut self, decoder: Arc<dyn Decoder>) -> Self {
        self.root = self.root.decoder(decoder);
        self
    }

    pub fn format(self, format: BodyFormat) -> Self {
        self.decoder(format.decoder())
    }

    pub fn child(mut self, child: NodeBuilder) -> Self {
        self.root = self.root.child(child);
        self
    }

    /// Assembles the tree.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::InvalidUrl`] for a malformed base URL
    /// - [`ConfigError::InvalidSymbol`] for a symbol breaking identifier rules
    /// - [`ConfigError::InvalidPathTemplate`] for a malformed path
    /// - [`ConfigError::DuplicateChild`] for two siblings with one symbol
    /// - [`ConfigError::EndpointWithChildren`] for an endpoint with children
    /// - [`ConfigError::ParamRedeclared`] under [`Redeclaration::Reject`]
    pub fn build(self) -> Result<Api, ConfigError> {
        if let Some(base) = &self.root.path
            && !base.contains('{')
        {
            url::Url::parse(base)?;
        }

        let mut index = HashMap::new();
        let root = assemble(self.root, None, self.redeclaration, &mut index)?;
        index.insert(String::new(), Arc::clone(&root));

        debug!(api = %root.symbol, nodes = index.len(), "API tree assembled");
        Ok(Api { root, index })
    }
}

fn assemble(
    builder: NodeBuilder,
    parent: Option<&Node>,
    policy: Redeclaration,
    index: &mut HashMap<String, Arc<Node>>,
) -> Result<Arc<Node>, ConfigError> {
    let NodeBuilder {
        kind,
        symbol,
        path,
        description,
        params: declared,
        processors,
        decoder,
        children: child_builders,
    } = builder;

    let symbol = Symbol::new(symbol)?;
    if kind == NodeKind::Endpoint && !child_builders.is_empty() {
        return Err(ConfigError::EndpointWithChildren {
            symbol: symbol.to_string(),
        });
    }

    let key = match parent {
        Some(p) if !p.key.is_empty() => format!("{}.{symbol}", p.key),
        Some(_) => symbol.to_string(),
        None => String::new(),
    };
    let owner = if key.is_empty() { symbol.to_string() } else { key.clone() };

    let fragment = path.unwrap_or_else(|| format!("/{symbol}"));
    let full_path = match parent {
        Some(p) => format!("{}{fragment}", p.path),
        None => fragment.clone(),
    };
    UriTemplate::parse(&full_path)?;

    let mut params = match parent {
        Some(p) => ParamSet::with_parent(owner, Arc::clone(&p.params), policy),
        None => ParamSet::new(owner),
    };
    for (name, options) in declared {
        params.add(name, options)?;
    }
    for name in placeholders(&fragment)? {
        params.add_path_param(&name);
    }

    let mut pipeline = match parent {
        Some(p) => TransformPipeline::with_parent(Arc::clone(&p.pipeline)),
        None => TransformPipeline::new(),
    };
    for processor in processors {
        pipeline.push(processor);
    }

    let decoder = decoder
        .or_else(|| parent.map(|p| Arc::clone(&p.decoder)))
        .unwrap_or_else(|| Arc::new(JsonDecoder) as Arc<dyn Decoder>);

    let mut node = Node {
        kind,
        symbol,
        key,
        path: full_path,
        description,
        params: Arc::new(params),
        pipeline: Arc::new(pipeline),
        decoder,
        children: IndexMap::new(),
    };

    debug!(
        node = %node.key,
        kind = %node.kind,
        path = %node.path,
        params = node.params.all_params().len(),
        processors = node.pipeline.all_processors().len(),
        "resolved node"
    );

    let mut children = IndexMap::new();
    for child in child_builders {
        let child = assemble(child, Some(&node), policy, index)?;
        let symbol = child.symbol.to_string();
        if children.contains_key(&symbol) {
            return Err(ConfigError::DuplicateChild {
                parent: node.symbol.to_string(),
                symbol,
            });
        }
        index.insert(child.key.clone(), Arc::clone(&child));
        children.insert(symbol, child);
    }
    node.children = children;

    Ok(Arc::new(node))
}
