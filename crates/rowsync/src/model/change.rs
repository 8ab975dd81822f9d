//! Change operations and edit scripts.
//!
//! An [`EditScript`] is the output of one diff: every deletion, addressed in
//! the *old* sequence's indexing and sorted ascending, followed by every
//! insertion, addressed in the *new* sequence's indexing and sorted
//! ascending. Hosts apply it as one atomic batch.

use std::fmt;

use super::address::Address;
use crate::error::{Error, Result};

/// The kind of a structural change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A row appears.
    Insert,
    /// A row disappears.
    Delete,
}

/// One structural change to a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeOp {
    /// Insert a row; the address is in the new sequence's indexing.
    Insert(Address),
    /// Delete a row; the address is in the old sequence's indexing.
    Delete(Address),
}

impl ChangeOp {
    /// The address this operation targets.
    pub fn address(&self) -> Address {
        match *self {
            ChangeOp::Insert(address) | ChangeOp::Delete(address) => address,
        }
    }

    /// The kind of this operation.
    pub fn kind(&self) -> ChangeKind {
        match self {
            ChangeOp::Insert(_) => ChangeKind::Insert,
            ChangeOp::Delete(_) => ChangeKind::Delete,
        }
    }

    /// Returns `true` for insertions.
    pub fn is_insert(&self) -> bool {
        matches!(self, ChangeOp::Insert(_))
    }

    /// Returns `true` for deletions.
    pub fn is_delete(&self) -> bool {
        matches!(self, ChangeOp::Delete(_))
    }

    /// Returns the same operation addressed in `section`.
    pub fn with_section(self, section: usize) -> Self {
        match self {
            ChangeOp::Insert(address) => ChangeOp::Insert(address.with_section(section)),
            ChangeOp::Delete(address) => ChangeOp::Delete(address.with_section(section)),
        }
    }
}

impl fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeOp::Insert(address) => write!(f, "insert {address}"),
            ChangeOp::Delete(address) => write!(f, "delete {address}"),
        }
    }
}

/// An ordered list of changes produced by one diff.
///
/// Deletions come first (ascending old index), then insertions (ascending
/// new index).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditScript {
    ops: Vec<ChangeOp>,
}

impl EditScript {
    /// Creates an empty edit script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a section-relative script from ascending row lists.
    pub(crate) fn from_rows(deleted: Vec<usize>, inserted: Vec<usize>) -> Self {
        let ops = deleted
            .into_iter()
            .map(|row| ChangeOp::Delete(Address::row(row)))
            .chain(
                inserted
                    .into_iter()
                    .map(|row| ChangeOp::Insert(Address::row(row))),
            )
            .collect();
        Self { ops }
    }

    /// The operations, in application order.
    pub fn ops(&self) -> &[ChangeOp] {
        &self.ops
    }

    /// Iterates over the operations in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeOp> {
        self.ops.iter()
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` if the script changes nothing.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Addresses of deleted rows (old indexing), ascending.
    pub fn deletions(&self) -> impl Iterator<Item = Address> + '_ {
        self.ops
            .iter()
            .filter(|op| op.is_delete())
            .map(ChangeOp::address)
    }

    /// Addresses of inserted rows (new indexing), ascending.
    pub fn insertions(&self) -> impl Iterator<Item = Address> + '_ {
        self.ops
            .iter()
            .filter(|op| op.is_insert())
            .map(ChangeOp::address)
    }

    /// Number of deletions.
    pub fn delete_count(&self) -> usize {
        self.deletions().count()
    }

    /// Number of insertions.
    pub fn insert_count(&self) -> usize {
        self.insertions().count()
    }

    /// Returns this script with every address qualified by `section`.
    pub fn in_section(&self, section: usize) -> Self {
        Self {
            ops: self.ops.iter().map(|op| op.with_section(section)).collect(),
        }
    }

    /// Checks that this script turns `old_len` rows into `new_len` rows.
    ///
    /// The script must list deletions before insertions, each group strictly
    /// ascending and in bounds for its own indexing, and its net row change
    /// must match. `section` is only used to label the error.
    pub fn validate(&self, section: usize, old_len: usize, new_len: usize) -> Result<()> {
        let mut last_delete: Option<usize> = None;
        let mut last_insert: Option<usize> = None;

        for op in &self.ops {
            let row = op.address().row;
            match op {
                ChangeOp::Delete(_) => {
                    if last_insert.is_some() {
                        return Err(Error::inconsistent(
                            section,
                            format!("delete of row {row} listed after an insertion"),
                        ));
                    }
                    if row >= old_len {
                        return Err(Error::inconsistent(
                            section,
                            format!("delete of row {row} but only {old_len} rows exist"),
                        ));
                    }
                    if last_delete.is_some_and(|prev| prev >= row) {
                        return Err(Error::inconsistent(
                            section,
                            format!("deletions not strictly ascending at row {row}"),
                        ));
                    }
                    last_delete = Some(row);
                }
                ChangeOp::Insert(_) => {
                    if row >= new_len {
                        return Err(Error::inconsistent(
                            section,
                            format!("insert at row {row} but the section ends at {new_len}"),
                        ));
                    }
                    if last_insert.is_some_and(|prev| prev >= row) {
                        return Err(Error::inconsistent(
                            section,
                            format!("insertions not strictly ascending at row {row}"),
                        ));
                    }
                    last_insert = Some(row);
                }
            }
        }

        let expected = (old_len + self.insert_count()).checked_sub(self.delete_count());
        if expected != Some(new_len) {
            return Err(Error::inconsistent(
                section,
                format!(
                    "{old_len} rows - {} deleted + {} inserted != {new_len} rows",
                    self.delete_count(),
                    self.insert_count()
                ),
            ));
        }

        Ok(())
    }

    /// Applies this script to `target`, taking inserted values from `new`.
    ///
    /// Deletions are applied highest row first so earlier removals do not
    /// shift later ones, then insertions ascending. On success `target`
    /// equals `new` whenever the script came from `diff(target, new)`.
    pub fn apply_to<T: Clone>(&self, target: &mut Vec<T>, new: &[T]) -> Result<()> {
        let section = self.ops.first().map_or(0, |op| op.address().section);
        self.validate(section, target.len(), new.len())?;

        let deleted: Vec<usize> = self.deletions().map(|address| address.row).collect();
        for row in deleted.into_iter().rev() {
            target.remove(row);
        }
        for address in self.insertions() {
            target.insert(address.row, new[address.row].clone());
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a ChangeOp;
    type IntoIter = std::slice::Iter<'a, ChangeOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl fmt::Display for EditScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, op) in self.ops.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{op}")?;
        }
        write!(f, "]")
    }
}
