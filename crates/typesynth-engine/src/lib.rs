//! Typesynth engine
//!
//! Package-access elevation over a host type system: the
//! [`PackageAccessElevator`] builds bridge types through the IR crate and
//! hands them to a [`Loader`], the [`SynthesisContext`] caches results per
//! base type, and [`sim`] provides an in-memory host to run everything
//! against.

pub mod config;
pub mod context;
pub mod elevate;
pub mod error;
pub mod host;
pub mod sim;
pub mod slots;

pub use config::{ElevationConfig, DEFAULT_BRIDGE_INFIX, DEFAULT_PLATFORM_PREFIXES};
pub use context::SynthesisContext;
pub use elevate::{qualifying_methods, PackageAccessElevator};
pub use error::{ConfigError, ExecError, SlotError, SynthesisError};
pub use host::{Introspector, Loader, ReflectedType};
pub use slots::{DynamicSlots, SlotCell, SlotPrimitive, SlotVariable};
