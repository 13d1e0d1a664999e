//! Parameter declarations, coercion and formatting.
//!
//! A [`ParamSet`] holds the parameters of one node and links to its parent's
//! set, so every endpoint accepts its own parameters plus everything declared
//! on its ancestors.

mod coerce;
mod definition;
mod format;
mod set;

pub use coerce::{Capability, EnumMapping, ParamType, ValueKind};
pub use definition::{Param, ParamOptions};
pub use format::{Formatter, to_wire};
pub use set::{ParamSet, Redeclaration};
