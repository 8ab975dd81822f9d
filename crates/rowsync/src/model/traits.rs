//! Traits at the coordinator's seams.
//!
//! The coordinator talks to three kinds of collaborators:
//!
//! - [`Section`]: an observable sequence of items (implemented by
//!   [`SectionModel`](super::SectionModel))
//! - [`HostView`]: the list widget that owns cells and applies row batches
//! - [`CoordinatorOwner`]: an optional observer of selection and display
//!   events
//!
//! # Implementing a Host View
//!
//! ```
//! use rowsync::model::{BatchRejected, EditScript, HostView};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct LoggingHost {
//!     log: Mutex<Vec<String>>,
//! }
//!
//! impl HostView for LoggingHost {
//!     fn reload_section(&self, section: usize) {
//!         self.log.lock().unwrap().push(format!("reload {section}"));
//!     }
//!
//!     fn apply_batch(&self, batch: &EditScript) -> Result<(), BatchRejected> {
//!         self.log.lock().unwrap().push(batch.to_string());
//!         Ok(())
//!     }
//! }
//! ```

use std::any::Any;

use rowsync_core::Signal;

use super::address::Address;
use super::change::EditScript;
use super::registry::{AnyItem, CellType};
use crate::error::Result;

/// An observable sequence of items, with the item type erased.
///
/// Implementors publish a section-relative [`EditScript`] on
/// [`content_changed`](Section::content_changed) after every change, in the
/// order the changes happened.
pub trait Section: Send + Sync {
    /// Current number of items.
    fn len(&self) -> usize;

    /// Returns `true` if the section has no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The item at `row`, erased.
    ///
    /// Fails with [`Error::IndexOutOfRange`](crate::Error::IndexOutOfRange).
    fn item_at(&self, row: usize) -> Result<AnyItem>;

    /// Signal carrying every content change.
    fn content_changed(&self) -> &Signal<EditScript>;
}

/// A host view's refusal to apply a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct BatchRejected {
    /// Why the host refused.
    pub reason: String,
}

impl BatchRejected {
    /// Create a rejection.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The list widget the coordinator drives.
///
/// All methods take `&self`; hosts that keep state use interior mutability,
/// because batches arrive from section subscriptions.
pub trait HostView: Send + Sync {
    /// Declares which cell type backs `reuse_id`.
    ///
    /// Called once per renderer registration.
    fn register_cell(&self, _reuse_id: &str, _cell_type: CellType) {}

    /// Re-reads every row of `section` from the coordinator.
    fn reload_section(&self, section: usize);

    /// Re-reads everything.
    ///
    /// The default reloads each section in turn.
    fn reload_all(&self, section_count: usize) {
        for section in 0..section_count {
            self.reload_section(section);
        }
    }

    /// Applies one section-qualified batch atomically: every deletion (old
    /// indexing), then every insertion (new indexing).
    ///
    /// A host that cannot apply the whole batch must apply none of it and
    /// return [`BatchRejected`].
    fn apply_batch(&self, batch: &EditScript) -> std::result::Result<(), BatchRejected>;
}

/// Optional observer of user-facing row events.
///
/// The coordinator holds its owner weakly; a dropped owner simply stops
/// receiving events.
pub trait CoordinatorOwner: Send + Sync {
    /// A row was selected.
    fn row_selected(&self, _address: Address, _item: &AnyItem) {}

    /// A configured cell is about to be shown.
    fn will_display(&self, _address: Address, _cell: &mut dyn Any) {}
}
