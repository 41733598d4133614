//! Sorting types shared by all dialects.

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Asc,
    /// Descending order (Z-A, 9-0).
    Desc,
}

impl Direction {
    /// Returns the lower-case keyword used by the URL dialects.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One sort key: attribute (or raw address) plus direction.
///
/// # Example
///
/// ```
/// use wirequery::query::Sorter;
///
/// let primary = Sorter::desc("Total");
/// let secondary = Sorter::asc("Name");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Sorter {
    /// Attribute alias, or a raw data address unknown to the model.
    pub attribute: String,
    /// Sort direction.
    pub direction: Direction,
}

impl Sorter {
    /// Creates an ascending sorter.
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Asc,
        }
    }

    /// Creates a descending sorter.
    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            direction: Direction::Desc,
        }
    }
}
