//! Pure domain types with minimal dependencies
//!
//! Geometry and the selection state machine. Types here have no process or
//! filesystem dependencies so they can be driven directly from tests and
//! from whatever presentation layer consumes the core.

pub mod geometry;
pub mod selection;

pub use geometry::*;
pub use selection::*;
