//! # Domain Layer for Beacon Propagation
//!
//! Pure logic with no I/O. This is the innermost layer of the hexagonal
//! architecture.
//!
//! ## Contents
//!
//! - **entities**: Segments, hop entries, beacons, interfaces (`Beacon`, `InterfaceSnapshot`)
//! - **value_objects**: Configuration (`PropagationConfig`, `AsRole`)
//! - **admission**: Egress selection and loop prevention (`admissible_interfaces`)
//! - **extender**: Hop MAC, AS signature and size bound (`Extender`)
//! - **invariants**: Segment invariant checks (non-empty, unique ASes, size)

mod admission;
mod entities;
mod extender;
mod invariants;
mod value_objects;

pub use admission::*;
pub use entities::*;
pub use extender::*;
pub use invariants::*;
pub use value_objects::*;
