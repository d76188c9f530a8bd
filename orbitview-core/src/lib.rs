//! Core data structures and traits for orbitview
//!
//! This crate provides the fundamental types shared by the viewer core:
//! checked vector/matrix helpers, the mesh [`Asset`], and the error taxonomy
//! surfaced to the UI shell.

pub mod error;
pub mod math;
pub mod mesh;
pub mod traits;

pub use error::*;
pub use math::{Matrix4f, Point3f, Rotation3f, Vector3f};
pub use mesh::*;
pub use traits::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix4, Point3, Unit, UnitQuaternion, Vector3};
