#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless grid searches shared by agent controllers and the fog driver.
//!
//! Both searches borrow a [`fogline_core::GridView`] for the duration of a
//! single call and keep their working state in dense, cell-indexed buffers
//! that are discarded when the call returns.

mod astar;
mod bfs;

pub use astar::{find_path, path_cost};
pub use bfs::{scan_layers, ScanLayers};
