//! Ordered, inheritable parameter collections.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use strum::{Display, EnumIter, EnumString};
use tracing::trace;

use super::definition::{Param, ParamOptions};
use crate::error::{ConfigError, ParamError};

/// What happens when a node declares a parameter an ancestor already declares.
///
/// ## Examples
///
/// ```
/// use declarest_lib::param::Redeclaration;
///
/// assert_eq!(Redeclaration::default(), Redeclaration::Reject);
/// assert_eq!("override".parse::<Redeclaration>().unwrap(), Redeclaration::Override);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Redeclaration {
    /// Fail tree assembly with [`ConfigError::ParamRedeclared`].
    #[default]
    Reject,
    /// The local declaration shadows the inherited one.
    Override,
    /// The local declaration is dropped and the inherited one kept.
    Ignore,
}

/// The parameters applicable to one node.
///
/// A set owns its local parameters and holds a shared, read-only link to the
/// parent node's set. [`ParamSet::all_params`] resolves the chain: inherited
/// parameters first, overlaid by local ones.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    owner: String,
    params: IndexMap<String, Param>,
    parent: Option<Arc<ParamSet>>,
    redeclaration: Redeclaration,
}

impl ParamSet {
    /// Creates an empty root set.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Creates an empty set inheriting from `parent`.
    pub fn with_parent(
        owner: impl Into<String>,
        parent: Arc<ParamSet>,
        redeclaration: Redeclaration,
    ) -> Self {
        Self {
            owner: owner.into(),
            params: IndexMap::new(),
            parent: Some(parent),
            redeclaration,
        }
    }

    /// Declares `name`, or merges `options` into an existing local
    /// declaration.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::ParamRedeclared`] when `name` is inherited and
    /// the set's [`Redeclaration`] policy is `Reject`.
    pub fn add(&mut self, name: impl Into<String>, options: ParamOptions) -> Result<(), ConfigError> {
        let name = name.into();

        if let Some(existing) = self.params.get_mut(&name) {
            existing.merge(options);
            return Ok(());
        }

        if self.inherits(&name) {
            match self.redeclaration {
                Redeclaration::Reject => {
                    return Err(ConfigError::ParamRedeclared {
                        node: self.owner.clone(),
                        name,
                    });
                }
                Redeclaration::Ignore => {
                    trace!(node = %self.owner, param = %name, "ignoring inherited re-declaration");
                    return Ok(());
                }
                Redeclaration::Override => {}
            }
        }

        self.params.insert(name.clone(), Param::new(name, options));
        Ok(())
    }

    /// Registers a `{placeholder}` of this node's own path fragment.
    ///
    /// A local declaration of the same name is forced positional. A name
    /// already inherited is left to the ancestor unless the ancestor sends it
    /// under another field, in which case a positional copy bound to the
    /// placeholder is declared locally.
    pub(crate) fn add_path_param(&mut self, name: &str) {
        if let Some(existing) = self.params.get_mut(name) {
            existing.force_positional();
            return;
        }
        match self.parent.as_ref().and_then(|parent| parent.get(name)) {
            Some(inherited) if inherited.field() == name => {}
            Some(inherited) => {
                let mut local = inherited.clone();
                local.force_positional();
                self.params.insert(name.to_string(), local);
            }
            None => {
                self.params.insert(name.to_string(), Param::from_path(name));
            }
        }
    }

    fn inherits(&self, name: &str) -> bool {
        self.parent
            .as_ref()
            .is_some_and(|parent| parent.get(name).is_some())
    }

    /// The node path that owns this set.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn parent(&self) -> Option<&Arc<ParamSet>> {
        self.parent.as_ref()
    }

    /// Resolves `name` locally first, then through the parent chain.
    pub fn get(&self, name: &str) -> Option<&Param> {
        self.params
            .get(name)
            .or_else(|| self.parent.as_ref().and_then(|p| p.get(name)))
    }

    /// Parameters declared on this node only.
    pub fn local_params(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    /// The parent's resolved parameters overlaid by local ones.
    ///
    /// Inherited parameters come first in their own order; a local
    /// declaration with an inherited name keeps the inherited position.
    pub fn all_params(&self) -> IndexMap<&str, &Param> {
        let mut all = match &self.parent {
            Some(parent) => parent.all_params(),
            None => IndexMap::new(),
        };
        for (name, param) in &self.params {
            all.insert(name.as_str(), param);
        }
        all
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.parent.as_ref().is_none_or(|p| p.is_empty())
    }

    /// Parameters in call-signature order: positional required, positional
    /// optional, keyword required, keyword optional.
    ///
    /// Within each group the resolved declaration order is kept, so the
    /// result is deterministic for identical sets.
    pub fn ordered_for_signature(&self) -> Vec<&Param> {
        let all = self.all_params();
        let group = |keyword: bool, required: bool| {
            all.values()
                .copied()
                .filter(move |p| p.is_keyword() == keyword && p.is_required() == required)
        };

        group(false, true)
            .chain(group(false, false))
            .chain(group(true, true))
            .chain(group(true, false))
            .collect()
    }

    /// Validates, converts and formats caller-supplied values.
    ///
    /// Returns a map from wire `field` to formatted string. Optional
    /// parameters that were not supplied (or supplied as null) fall back to
    /// their default, and are omitted entirely when they have none.
    ///
    /// ## Errors
    ///
    /// - [`ParamError::Unknown`] listing every name absent from
    ///   [`ParamSet::all_params`]
    /// - [`ParamError::Missing`] listing every required parameter not supplied
    /// - [`ParamError::Nonconvertible`] for the first value failing its type
    pub fn process_input(
        &self,
        values: &Map<String, Value>,
    ) -> Result<IndexMap<String, String>, ParamError> {
        let all = self.all_params();

        let unknown: Vec<String> = values
            .keys()
            .filter(|name| !all.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ParamError::Unknown { names: unknown });
        }

        let supplied = |name: &str| values.get(name).filter(|v| !v.is_null());

        let missing: Vec<String> = all
            .values()
            .filter(|p| p.is_required() && supplied(p.name()).is_none())
            .map(|p| p.name().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ParamError::Missing { names: missing });
        }

        let mut out = IndexMap::new();
        for param in all.values() {
            let Some(raw) = supplied(param.name()).or(param.default_value()) else {
                continue;
            };
            let formatted = param.convert_and_format(raw.clone())?;
            trace!(param = param.name(), field = param.field(), value = %formatted, "formatted parameter");
            out.insert(param.field().to_string(), formatted);
        }

        Ok(out)
    }
}
