//! Layered node attributes with precedence-ordered merging.
//!
//! A node's attributes live in ten precedence layers, from `default` up to
//! `automatic`. Recipes write into one layer at a time through
//! auto-vivifying views and read the merged result: maps merge key by key
//! across layers, and anything else is taken from the highest layer that
//! defines it. Merged results are memoized per path and invalidated eagerly
//! on writes, so a read always reflects every earlier write.
//!
//! Layers assigned from outside the attribute set (role and environment
//! data, discovered system facts) share their storage with the source and
//! are copied only when first written.
//!
//! ```
//! use node_attrs::{Attributes, KeyPath, Precedence};
//! use serde_json::json;
//!
//! # fn main() -> node_attrs::AttrResult<()> {
//! let mut attrs = Attributes::new();
//! attrs.set_layer(Precedence::Default, json!({"nginx": {"port": 80, "workers": 2}}))?;
//! attrs.write(Precedence::Override, &KeyPath::dotted("nginx.port")?, 8080)?;
//! assert_eq!(attrs.to_plain(), json!({"nginx": {"port": 8080, "workers": 2}}));
//! # Ok(())
//! # }
//! ```

mod attributes;
mod error;
pub mod file;
mod immutable;
mod key;
mod layer;
pub mod merge;
mod node;
mod observer;
mod precedence;
mod result_ext;
mod value;
mod view;

pub use attributes::Attributes;
pub use error::AttributeError;
pub use immutable::ImmutableView;
pub use key::{KeyPath, PathSegment};
pub use layer::{Layer, Ownership};
pub use merge::MergeCacheStats;
pub use node::{
    DEFAULT_ENVIRONMENT, Expansion, Node, NodeDocument, RunList, RunListItem, RunListKind,
};
pub use observer::{AttributeObserver, ChangeEvent};
pub use precedence::Precedence;
pub use result_ext::{AttrResultExt, FileResultExt};
pub use value::{AttrMap, Value, ValueKind};
pub use view::{ContainerView, ContainerWrite, LayerView, VividView};

/// Convenience alias for results returned by attribute operations.
pub type AttrResult<T> = Result<T, AttributeError>;
