//! Shared material model for the sandfall engine.
//!
//! # Invariants
//! - The material set is closed; every variant has exactly one descriptor.
//! - The registry is a `static` table and is never mutated.

pub mod material;

pub use material::{Material, MaterialDescriptor, ParseMaterialError};
