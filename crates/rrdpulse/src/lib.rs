//! Top-level facade crate for rrdpulse.
//!
//! Re-exports core types and the collector library so users can depend on a single crate.

pub mod core {
    pub use rrdpulse_core::*;
}

pub mod collector {
    pub use rrdpulse_collector::*;
}
