//! Binding keys and the handle registry
//!
//! ## Key Components
//!
//! - [`BindingKey`] - (service, module, function) triple addressing a slot
//! - [`Registry`] - concurrent, append-only map of keys to handle sets
//! - [`BindingDecl`] - groups several handlers under one service/module
//!
//! ## Example
//!
//! ```rust
//! use taskbind::binding::{BindingKey, Registry};
//! use taskbind::task::Handle;
//!
//! let registry = Registry::new();
//! let key = BindingKey::new("orders", "", "create");
//! registry.register(key.clone(), Handle::function("create", || 42));
//!
//! assert_eq!(registry.lookup(&key).len(), 1);
//! ```

mod decl;
mod key;
mod registry;

pub use decl::BindingDecl;
pub use key::{BindingKey, KEY_PREFIX, SEGMENT_SEPARATOR};
pub use registry::Registry;
