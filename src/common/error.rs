//! Error types for stardex.

use crate::common::PageId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in stardex.
///
/// Store failures are unrecoverable: they propagate to the caller of the
/// top-level operation with no retries and no partial-result masking.
/// Rebalancing decisions (rotate vs. split, rotate vs. merge) are normal
/// control flow and never appear here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from the backing file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested record does not exist in the store.
    #[error("{0} not found")]
    PageNotFound(PageId),

    /// A record failed checksum or tag verification on read.
    #[error("{0} is corrupted")]
    Corrupted(PageId),

    /// Order parameter too small for the B*-tree merge arithmetic.
    ///
    /// Construction-time error: the three-way merge needs `F >= 2`,
    /// i.e. an order of at least 4.
    #[error("order {0} is too small (minimum is 4)")]
    InvalidOrder(usize),
}
