//! Domain layer types and invariants.

pub mod device;
pub mod entities;
