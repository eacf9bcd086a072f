//! grid-reconcile: directional merge reconciliation for 2048-style grids
//!
//! This crate provides:
//! - A validated rectangular `Grid` with the four motions (`grid` module)
//! - The reconciliation pass that pairs mergeable cells along each scan line
//!   and reports every pair as an event (`reconcile` module)
//! - Host helpers to apply a pass and compact the grid (`apply` module)
//! - Key bindings, TOML config and a scoped key listener (`input`, `config`,
//!   `listener` modules)
//! - `ReconcilingGrid`, which wires keys to passes and delivers event batches
//!   (`widget` module)
//! - Parallel reconciliation of many independent grids (`batch` module)
//!
//! Quick start:
//! ```
//! use grid_reconcile::grid::{Direction, Grid};
//! use grid_reconcile::reconcile::reconcile;
//!
//! let grid = Grid::from_rows(vec![
//!     vec![2, 0, 2, 0],
//!     vec![4, 4, 4, 0],
//! ]).unwrap();
//! let events = reconcile(&grid, Direction::Left, |v| *v != 0, |a, b| a + b).unwrap();
//! // Row 0: (0,2) pairs with (0,0). Row 1: (1,2) pairs with (1,1); (1,0) is left over.
//! assert_eq!(events.len(), 2);
//! assert_eq!(events[1].result, 8);
//! ```
//!
//! Apply and keep going
//! ```
//! use grid_reconcile::apply::apply;
//! use grid_reconcile::grid::{Direction, Grid};
//! use grid_reconcile::reconcile::reconcile;
//!
//! let mut grid = Grid::from_rows(vec![vec![2, 2, 4, 0]]).unwrap();
//! for dir in [Direction::Right, Direction::Right] {
//!     let events = reconcile(&grid, dir, |v| *v != 0, |a, b| a + b).unwrap();
//!     grid = apply(&grid, dir, &events, 0).unwrap();
//! }
//! assert_eq!(grid.to_rows(), vec![vec![0, 0, 0, 8]]);
//! ```
//!
pub mod apply;
pub mod batch;
pub mod config;
pub mod grid;
pub mod ids;
pub mod input;
pub mod listener;
pub mod reconcile;
pub mod widget;
