//! Equality-based sequence diff.
//!
//! [`diff`] turns an old and a new sequence into the [`EditScript`] that
//! transforms one into the other, using only `==` on the items: no hashing
//! and no stable identity.
//!
//! # Algorithm
//!
//! The common prefix and suffix are matched first and never produce
//! operations. The remaining middle is solved with a longest common
//! subsequence table (O(n·m) time and space), walked backward from the end
//! of both sequences:
//!
//! - equal items step diagonally and are kept;
//! - otherwise the step that preserves the LCS length is taken, preferring a
//!   deletion from the old sequence when both a deletion and an insertion
//!   would do.
//!
//! The result is deterministic for a given pair of inputs. Equal values are
//! interchangeable: with duplicates, which physical copy is kept is
//! unspecified.

use rowsync_core::logging::{span_names, targets};
use rowsync_core::PerfSpan;

use super::change::EditScript;

/// Computes the edit script that turns `old` into `new`.
///
/// Deletions address `old` and insertions address `new`; all addresses are
/// section-relative (section 0).
///
/// # Example
///
/// ```
/// use rowsync::model::{diff, Address, ChangeOp};
///
/// let script = diff(&["A", "B", "C"], &["A", "C", "D"]);
/// assert_eq!(
///     script.ops(),
///     &[ChangeOp::Delete(Address::row(1)), ChangeOp::Insert(Address::row(2))]
/// );
/// ```
pub fn diff<T: PartialEq>(old: &[T], new: &[T]) -> EditScript {
    let _span = PerfSpan::new(span_names::DIFF);

    let prefix = old
        .iter()
        .zip(new)
        .take_while(|(a, b)| a == b)
        .count();
    let (old_rest, new_rest) = (&old[prefix..], &new[prefix..]);

    let suffix = old_rest
        .iter()
        .rev()
        .zip(new_rest.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_mid = &old_rest[..old_rest.len() - suffix];
    let new_mid = &new_rest[..new_rest.len() - suffix];

    let (mut deleted, mut inserted) = lcs_edits(old_mid, new_mid);
    for row in deleted.iter_mut().chain(inserted.iter_mut()) {
        *row += prefix;
    }

    tracing::debug!(
        target: targets::DIFF,
        old_len = old.len(),
        new_len = new.len(),
        prefix,
        suffix,
        deletes = deleted.len(),
        inserts = inserted.len(),
        "computed edit script"
    );

    EditScript::from_rows(deleted, inserted)
}

/// LCS over two slices; returns (deleted old rows, inserted new rows), both
/// ascending.
fn lcs_edits<T: PartialEq>(old: &[T], new: &[T]) -> (Vec<usize>, Vec<usize>) {
    let (n, m) = (old.len(), new.len());
    if n == 0 {
        return (Vec::new(), (0..m).collect());
    }
    if m == 0 {
        return ((0..n).collect(), Vec::new());
    }

    let table = LcsTable::build(old, new);

    let mut deleted = Vec::new();
    let mut inserted = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old[i - 1] == new[j - 1] {
            i -= 1;
            j -= 1;
        } else if i > 0 && (j == 0 || table.get(i - 1, j) >= table.get(i, j - 1)) {
            deleted.push(i - 1);
            i -= 1;
        } else {
            inserted.push(j - 1);
            j -= 1;
        }
    }

    deleted.reverse();
    inserted.reverse();
    (deleted, inserted)
}

/// Prefix LCS lengths: `get(i, j)` is the LCS of `old[..i]` and `new[..j]`.
struct LcsTable {
    cells: Vec<u32>,
    width: usize,
}

impl LcsTable {
    fn build<T: PartialEq>(old: &[T], new: &[T]) -> Self {
        let width = new.len() + 1;
        let mut cells = vec![0u32; (old.len() + 1) * width];
        for i in 1..=old.len() {
            for j in 1..=new.len() {
                cells[i * width + j] = if old[i - 1] == new[j - 1] {
                    cells[(i - 1) * width + (j - 1)] + 1
                } else {
                    cells[(i - 1) * width + j].max(cells[i * width + (j - 1)])
                };
            }
        }
        Self { cells, width }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }
}
