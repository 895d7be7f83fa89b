//! Store backends.
//!
//! - `RrdtoolStore`: drives the `rrdtool` command-line tool.
//! - `MemoryStore`: in-process, for tests and dry runs.

pub mod memory;
pub mod rrdtool;

pub use memory::{MemoryFile, MemoryStore};
pub use rrdtool::RrdtoolStore;
