//! Authorization: permission policy and per-user permission lookups

pub mod policy;
pub mod store;

// Re-export main components
pub use policy::{PermissionPolicy, RawRule};
pub use store::{PermissionStore, StaticPermissionStore};
