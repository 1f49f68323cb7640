pub mod local_refs;

pub use local_refs::{is_local_ref, LocalRefStore};
