//! Reactive section model.
//!
//! A [`SectionModel<T>`] holds one ordered sequence of items. Every change
//! goes through [`SectionModel::replace`] (the convenience mutators are built
//! on it), which diffs the prior sequence against the new one, swaps the
//! stored sequence and publishes the resulting [`EditScript`] on
//! [`content_changed`](SectionModel::content_changed).
//!
//! Scripts are published in the order the swaps happened, even when a
//! subscriber replaces the content again from inside its slot: the nested
//! script is queued and delivered after the current one has reached every
//! subscriber.
//!
//! # Example
//!
//! ```
//! use rowsync::model::SectionModel;
//! use std::sync::{Arc, Mutex};
//!
//! let section = SectionModel::new(vec!["A", "B", "C"]);
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let seen_clone = seen.clone();
//! section.content_changed().connect(move |script| {
//!     seen_clone.lock().unwrap().push(script.to_string());
//! });
//!
//! section.replace(vec!["A", "C", "D"]);
//! assert_eq!(
//!     seen.lock().unwrap().as_slice(),
//!     ["[delete section 0, row 1; insert section 0, row 2]"]
//! );
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rowsync_core::Signal;
use rowsync_core::logging::targets;

use super::change::EditScript;
use super::diff::diff;
use super::registry::AnyItem;
use super::traits::Section;
use crate::error::{Error, Result};

/// Scripts waiting to be published, in swap order.
#[derive(Default)]
struct Outbox {
    queue: VecDeque<EditScript>,
    draining: bool,
}

/// An observable, always-diffing sequence of items.
///
/// Items are stored behind `Arc`, so snapshots and lookups never copy item
/// data.
pub struct SectionModel<T> {
    items: RwLock<Vec<Arc<T>>>,
    /// Serializes read-modify-write cycles. Reentrant so a closure passed to
    /// `update` may itself mutate the section.
    mutation: ReentrantMutex<()>,
    revision: AtomicU64,
    outbox: Mutex<Outbox>,
    content_changed: Signal<EditScript>,
}

impl<T> SectionModel<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    /// Creates a section holding `items`.
    ///
    /// Nothing is published for the initial content; a coordinator picks it
    /// up with a full reload when the section is attached.
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(Arc::new).collect()),
            mutation: ReentrantMutex::new(()),
            revision: AtomicU64::new(0),
            outbox: Mutex::new(Outbox::default()),
            content_changed: Signal::new(),
        }
    }

    /// Creates an empty section.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Signal published with the edit script of every content change.
    ///
    /// Script addresses are section-relative (section 0).
    pub fn content_changed(&self) -> &Signal<EditScript> {
        &self.content_changed
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the section has no items.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Number of content changes so far.
    ///
    /// Replacing the content with an equal sequence does not count.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    /// Returns the item at `row`.
    pub fn item(&self, row: usize) -> Result<Arc<T>> {
        let items = self.items.read();
        items
            .get(row)
            .cloned()
            .ok_or_else(|| Error::index_out_of_range(row, items.len()))
    }

    /// Snapshot of the current sequence.
    pub fn items(&self) -> Vec<Arc<T>> {
        self.items.read().clone()
    }

    /// Replaces the whole sequence, publishing the diff against the prior one.
    ///
    /// Returns the published script; an empty script means nothing changed
    /// and nothing was published.
    pub fn replace(&self, items: Vec<T>) -> EditScript {
        self.replace_shared(items.into_iter().map(Arc::new).collect())
    }

    /// Like [`replace`](Self::replace) for items that are already shared.
    pub fn replace_shared(&self, items: Vec<Arc<T>>) -> EditScript {
        self.update(move |current| *current = items)
    }

    /// Edits a working copy of the sequence and commits it with `replace`
    /// semantics.
    ///
    /// The read-modify-write is atomic with respect to other mutators. No
    /// lock on the items is held while `edit` runs, so it may read the
    /// section. Changes the closure makes to the section directly are
    /// published, then overwritten by the closure's result.
    pub fn update<F>(&self, edit: F) -> EditScript
    where
        F: FnOnce(&mut Vec<Arc<T>>),
    {
        self.try_update(|items| {
            edit(items);
            Ok(())
        })
        .unwrap_or_default()
    }

    /// Appends an item.
    pub fn push(&self, item: T) -> EditScript {
        let item = Arc::new(item);
        self.update(move |items| items.push(item))
    }

    /// Inserts an item at `row`; `row == len()` appends.
    pub fn insert(&self, row: usize, item: T) -> Result<EditScript> {
        let item = Arc::new(item);
        self.try_update(move |items| {
            if row > items.len() {
                return Err(Error::index_out_of_range(row, items.len()));
            }
            items.insert(row, item);
            Ok(())
        })
    }

    /// Removes and returns the item at `row`.
    pub fn remove(&self, row: usize) -> Result<Arc<T>> {
        let mut removed = None;
        self.try_update(|items| {
            if row >= items.len() {
                return Err(Error::index_out_of_range(row, items.len()));
            }
            removed = Some(items.remove(row));
            Ok(())
        })?;
        removed.ok_or_else(|| Error::index_out_of_range(row, 0))
    }

    /// Removes the first item equal to `item`, returning its former row.
    pub fn remove_first(&self, item: &T) -> Option<usize> {
        let mut found = None;
        self.update(|items| {
            if let Some(row) = items.iter().position(|candidate| **candidate == *item) {
                items.remove(row);
                found = Some(row);
            }
        });
        found
    }

    /// Removes every item.
    pub fn clear(&self) -> EditScript {
        self.update(Vec::clear)
    }

    fn try_update<F>(&self, edit: F) -> Result<EditScript>
    where
        F: FnOnce(&mut Vec<Arc<T>>) -> Result<()>,
    {
        let serial = self.mutation.lock();
        let mut next = self.items.read().clone();
        edit(&mut next)?;

        let script = {
            let mut items = self.items.write();
            let script = diff(items.as_slice(), &next);
            if script.is_empty() {
                return Ok(script);
            }

            *items = next;
            let revision = self.revision.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::debug!(
                target: targets::SECTION,
                revision,
                len = items.len(),
                ops = script.len(),
                "section content replaced"
            );

            // Queue while the write lock is held so queue order matches swap order.
            self.outbox.lock().queue.push_back(script.clone());
            script
        };
        drop(serial);

        self.publish_pending();
        Ok(script)
    }

    /// Delivers queued scripts unless an outer call is already doing so.
    fn publish_pending(&self) {
        {
            let mut outbox = self.outbox.lock();
            if outbox.draining {
                return;
            }
            outbox.draining = true;
        }

        loop {
            let next = {
                let mut outbox = self.outbox.lock();
                match outbox.queue.pop_front() {
                    Some(script) => script,
                    None => {
                        outbox.draining = false;
                        return;
                    }
                }
            };
            self.content_changed.emit(next);
        }
    }
}

impl<T> Default for SectionModel<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> FromIterator<T> for SectionModel<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<T: fmt::Debug> fmt::Debug for SectionModel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionModel")
            .field("items", &*self.items.read())
            .field("revision", &self.revision.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<T> Section for SectionModel<T>
where
    T: PartialEq + Send + Sync + 'static,
{
    fn len(&self) -> usize {
        SectionModel::len(self)
    }

    fn item_at(&self, row: usize) -> Result<AnyItem> {
        let item = self.item(row)?;
        // A section of already erased items hands them out unwrapped.
        let any: &dyn Any = &*item;
        if let Some(erased) = any.downcast_ref::<AnyItem>() {
            return Ok(erased.clone());
        }
        Ok(AnyItem::new(item))
    }

    fn content_changed(&self) -> &Signal<EditScript> {
        &self.content_changed
    }
}

static_assertions::assert_impl_all!(SectionModel<String>: Send, Sync);
