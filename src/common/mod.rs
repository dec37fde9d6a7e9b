//! Common types and utilities shared across stardex.
//!
//! This module contains fundamental primitives used throughout the codebase:
//! - Configuration constants and record sizing
//! - Error types
//! - Identifiers (PageId)

pub mod config;
pub mod error;
mod page_id;

pub use error::{Error, Result};
pub use page_id::PageId;
