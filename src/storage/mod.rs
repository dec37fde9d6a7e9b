//! Storage layer - disk I/O for fixed-size records.
//!
//! This module handles persistent storage:
//! - [`Pager`] - Low-level record file I/O

mod pager;

pub use pager::Pager;
