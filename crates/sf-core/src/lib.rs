//! sf-core: stable foundation for sewerflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - ids (stable compact IDs for network objects)
//! - clock (integer routing ticks mapped onto calendar dates)
//! - error (shared error types)

pub mod clock;
pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use clock::{SimClock, Ticks};
pub use error::{SfError, SfResult};
pub use ids::*;
pub use numeric::*;
