//! Addresses for rows within a list of sections.
//!
//! An `Address` is the fundamental way views, owners and edit scripts refer
//! to an item: the index of its section plus its row within that section.

use std::fmt;

/// Identifies one row within a list of sections.
///
/// # Address Validity
///
/// Addresses should be used immediately and not stored long-term. After any
/// section mutation, previously obtained addresses may name a different item
/// or no item at all.
///
/// # Example
///
/// ```
/// use rowsync::model::Address;
///
/// let address = Address::new(1, 4);
/// assert_eq!(address.section, 1);
/// assert_eq!(address.row, 4);
/// assert_eq!(address.with_section(3), Address::new(3, 4));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address {
    /// Index of the section in the coordinator's section list.
    pub section: usize,
    /// Row within the section.
    pub row: usize,
}

impl Address {
    /// Creates an address for `row` in `section`.
    #[inline]
    pub const fn new(section: usize, row: usize) -> Self {
        Self { section, row }
    }

    /// Creates a section-relative address (section 0).
    ///
    /// Edit scripts straight out of the diff engine use these; the
    /// coordinator re-qualifies them with the real section index.
    #[inline]
    pub const fn row(row: usize) -> Self {
        Self { section: 0, row }
    }

    /// Returns this address moved into `section`, keeping the row.
    #[inline]
    pub const fn with_section(self, section: usize) -> Self {
        Self {
            section,
            row: self.row,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "section {}, row {}", self.section, self.row)
    }
}

impl From<(usize, usize)> for Address {
    fn from((section, row): (usize, usize)) -> Self {
        Self::new(section, row)
    }
}
