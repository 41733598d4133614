//! Pagination window.

/// The window of rows a read query asks for.
///
/// A limit of `0` means "unbounded": no limit parameter is emitted and
/// fan-out/over-fetch pagination tricks are suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryWindow {
    offset: u64,
    limit: u64,
}

impl QueryWindow {
    /// Creates a window with the given offset and limit.
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// Creates an unbounded window starting at row zero.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Returns the row offset.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the row limit (`0` = unbounded).
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Returns `true` if no limit applies.
    pub fn is_unbounded(&self) -> bool {
        self.limit == 0
    }
}
