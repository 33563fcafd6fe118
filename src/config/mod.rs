//! Build-time platform capability table.
//!
//! libzip builds are configured by a generated `config.h` that records, per
//! target platform, which standard-library facilities exist and how wide the
//! primitive C types are. This module carries that contract as data: a
//! [`CapabilitySet`] resolved once from a [`Platform`] discriminant, never
//! mutated afterwards.
//!
//! ## Model
//!
//! - A capability is either a presence flag (defined or not, no value) or a
//!   sized constant (the byte width of a primitive type).
//! - Exactly one of two platform branches is active per resolution: the
//!   Apple family or everything else POSIX-like. The branches are disjoint
//!   lists, not a base list with overrides.
//! - When a platform lacks a native signed-size type, a substitute is
//!   derived by matching the recorded `size_t` width against the candidate
//!   integer kinds. No match is a fatal configuration error.

mod capability;
mod error;
mod platform;

pub use capability::{CapabilityKind, CapabilitySet, SignedSizeRepr, PACKAGE, VERSION};
pub use error::ConfigError;
pub use platform::Platform;
