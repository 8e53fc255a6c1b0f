//! In-memory reference host
//!
//! [`InMemoryHost`] implements both host ports over a registry of type
//! descriptors and enforces the scope rules a real host applies when types are
//! materialized. [`Machine`] runs the registered bodies so synthesized types
//! can be checked by behavior, not only by shape.

pub mod host;
pub mod machine;
pub mod value;

pub use host::{InMemoryHost, ROOT_TYPE};
pub use machine::{Machine, MAX_CALL_DEPTH};
pub use value::{Heap, HeapEntry, ObjectId, Value};
