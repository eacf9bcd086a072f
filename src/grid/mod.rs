//! Grid model: a rectangular matrix of scalar cells, the four motions, and
//! the scan lines each motion walks.
//!
//! - `Grid` is validated on construction and never mutated by the reconciler.
//! - `Direction` picks the scan axis and the traversal order along it.
//! - Scan-line generation lives in its own submodule so the reconciler and the
//!   compaction helper walk cells in exactly the same order.

mod scan;
pub mod state;

pub use scan::ScanLine;
pub use state::{Coordinate, Direction, Grid, GridError, ParseDirectionError};
