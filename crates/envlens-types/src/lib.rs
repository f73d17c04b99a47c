//! Foundation types for envlens.
//!
//! This crate contains the types shared by every envlens crate: the error
//! enum, the environment data model, slot identifiers, and the comparison
//! session consumed by the comparison page.

pub mod env;
pub mod error;
pub mod slot;

pub use env::{ComparisonSession, EnvType, Environment, EnvironmentRef};
pub use error::{EnvlensError, Result};
pub use slot::SlotId;
