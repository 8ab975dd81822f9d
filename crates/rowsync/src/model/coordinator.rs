//! The update coordinator.
//!
//! [`UpdateCoordinator`] sits between sections and a host view. It owns the
//! renderer registry and the list of attached sections, answers the host's
//! row queries, and turns every section change into one section-qualified
//! batch for the host.
//!
//! # Batches
//!
//! Sections publish section-relative edit scripts. The coordinator
//! re-addresses each script with the section's index in its list, checks it
//! against the number of rows the host currently shows for that section
//! (unless [`verify_batches`](CoordinatorConfig::verify_batches) is off) and
//! hands it to [`HostView::apply_batch`]. Scripts are forwarded in the order
//! the section published them; nothing is merged or reordered.
//!
//! A batch that fails verification, or that the host rejects, is never
//! partially applied. When the batch came from a section subscription the
//! failure is logged and published on
//! [`batch_failed`](UpdateCoordinator::batch_failed).
//!
//! # Example
//!
//! ```
//! use rowsync::model::{
//!     Address, BatchRejected, CellRenderer, EditScript, HostView, SectionModel,
//!     UpdateCoordinator,
//! };
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Host {
//!     batches: Mutex<Vec<String>>,
//! }
//!
//! impl HostView for Host {
//!     fn reload_section(&self, _section: usize) {}
//!     fn apply_batch(&self, batch: &EditScript) -> Result<(), BatchRejected> {
//!         self.batches.lock().unwrap().push(batch.to_string());
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Label(String);
//!
//! let coordinator = UpdateCoordinator::new(Host::default());
//! coordinator
//!     .register(CellRenderer::<Label, String>::new(|cell, text, _| cell.0 = text.clone()))
//!     .unwrap();
//!
//! let section = Arc::new(SectionModel::new(vec!["a".to_string()]));
//! let index = coordinator.add_section(section.clone());
//!
//! section.push("b".to_string());
//! assert_eq!(
//!     coordinator.host().batches.lock().unwrap().as_slice(),
//!     ["[insert section 0, row 1]"]
//! );
//!
//! let mut cell = Label::default();
//! coordinator.configure_cell(&mut cell, Address::new(index, 1)).unwrap();
//! assert_eq!(cell.0, "b");
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rowsync_core::logging::{span_names, targets};
use rowsync_core::{ConnectionGuard, PerfSpan, Signal};

use super::address::Address;
use super::change::EditScript;
use super::registry::{AnyItem, RendererDescriptor, RendererRegistry};
use super::traits::{CoordinatorOwner, HostView, Section};
use crate::config::CoordinatorConfig;
use crate::error::{Error, Result};

/// A section attached to a coordinator.
struct Attached {
    section: Arc<dyn Section>,
    /// Rows the host shows for this section after the last applied batch.
    host_rows: usize,
    _subscription: ConnectionGuard<EditScript>,
}

struct Inner<H> {
    host: H,
    config: CoordinatorConfig,
    registry: RwLock<RendererRegistry>,
    sections: RwLock<Vec<Attached>>,
    owner: RwLock<Option<Weak<dyn CoordinatorOwner>>>,
    size_cache: Mutex<HashMap<Address, f32>>,
    batch_failed: Signal<Error>,
}

/// Drives a host view from a list of observable sections.
///
/// Section subscriptions hold the coordinator weakly; dropping the
/// coordinator disconnects them.
pub struct UpdateCoordinator<H: HostView + 'static> {
    inner: Arc<Inner<H>>,
}

impl<H: HostView + 'static> UpdateCoordinator<H> {
    /// Creates a coordinator with the default configuration.
    pub fn new(host: H) -> Self {
        Self::build(host, CoordinatorConfig::default())
    }

    /// Creates a coordinator with a custom configuration.
    ///
    /// Fails with [`Error::Config`] if the configuration is invalid.
    pub fn with_config(host: H, config: CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(host, config))
    }

    fn build(host: H, config: CoordinatorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                config,
                registry: RwLock::new(RendererRegistry::with_default_row_height(
                    config.default_row_height,
                )),
                sections: RwLock::new(Vec::new()),
                owner: RwLock::new(None),
                size_cache: Mutex::new(HashMap::new()),
                batch_failed: Signal::new(),
            }),
        }
    }

    /// The host view.
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// The configuration in effect.
    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Signal published when a batch triggered by a section change could not
    /// be applied.
    pub fn batch_failed(&self) -> &Signal<Error> {
        &self.inner.batch_failed
    }

    /// Sets the owner that receives selection and display events.
    ///
    /// Only a weak reference is kept.
    pub fn set_owner<O: CoordinatorOwner + 'static>(&self, owner: &Arc<O>) {
        let owner: Weak<O> = Arc::downgrade(owner);
        let owner: Weak<dyn CoordinatorOwner> = owner;
        *self.inner.owner.write() = Some(owner);
    }

    /// Forgets the owner.
    pub fn clear_owner(&self) {
        *self.inner.owner.write() = None;
    }

    /// Returns `true` if an owner is set and still alive.
    pub fn has_owner(&self) -> bool {
        self.inner.owner().is_some()
    }

    /// Registers a renderer and declares its cell type to the host.
    ///
    /// Fails with [`Error::DuplicateRendererKey`] if the item type already
    /// has a renderer.
    pub fn register(&self, descriptor: impl Into<RendererDescriptor>) -> Result<()> {
        let (reuse_id, cell_type) = {
            let mut registry = self.inner.registry.write();
            let descriptor = registry.register(descriptor)?;
            (descriptor.reuse_id().to_string(), descriptor.cell_type())
        };
        self.inner.host.register_cell(&reuse_id, cell_type);
        Ok(())
    }

    /// Returns `true` if items of type `T` have a renderer.
    pub fn has_renderer<T: 'static>(&self) -> bool {
        self.inner.registry.read().contains::<T>()
    }

    /// Attaches a section, returning its index.
    ///
    /// The host reloads the new section in full; later changes arrive as
    /// batches.
    pub fn add_section<S: Section + 'static>(&self, section: Arc<S>) -> usize {
        let section: Arc<dyn Section> = section;
        let index = {
            let mut sections = self.inner.sections.write();
            let index = sections.len();

            let weak = Arc::downgrade(&self.inner);
            let subscription = section.content_changed().connect_scoped(move |script| {
                if let Some(inner) = weak.upgrade() {
                    inner.forward(index, script);
                }
            });

            sections.push(Attached {
                host_rows: section.len(),
                section,
                _subscription: subscription,
            });
            index
        };

        self.inner.invalidate_sizes(Some(index));
        tracing::debug!(
            target: targets::COORDINATOR,
            section = index,
            "attached section, reloading"
        );
        self.inner.host.reload_section(index);
        index
    }

    /// Number of attached sections.
    pub fn section_count(&self) -> usize {
        self.inner.sections.read().len()
    }

    /// Current number of rows in `section`.
    pub fn row_count(&self, section: usize) -> Result<usize> {
        Ok(self.inner.section(section)?.len())
    }

    /// The item at `address`.
    pub fn item_at(&self, address: Address) -> Result<AnyItem> {
        self.inner.item_at(address)
    }

    /// The item at `address` and the renderer for its type.
    ///
    /// Fails with [`Error::InvalidAddress`] if the section or row does not
    /// exist, or [`Error::RendererNotFound`] if the item's type has no
    /// renderer.
    pub fn resolve(&self, address: Address) -> Result<(AnyItem, RendererDescriptor)> {
        self.inner.resolve(address)
    }

    /// The reuse identifier of the cell the host should use at `address`.
    pub fn reuse_id_for(&self, address: Address) -> Result<String> {
        let (_, descriptor) = self.inner.resolve(address)?;
        Ok(descriptor.reuse_id().to_string())
    }

    /// Row height at `address`.
    pub fn size_for(&self, address: Address) -> Result<f32> {
        let cache = self.inner.config.cache_row_sizes;
        if cache {
            if let Some(size) = self.inner.size_cache.lock().get(&address) {
                return Ok(*size);
            }
        }

        let (item, descriptor) = self.inner.resolve(address)?;
        let size = descriptor
            .height_for(&item)
            .unwrap_or(self.inner.config.default_row_height);

        if cache {
            self.inner.size_cache.lock().insert(address, size);
        }
        Ok(size)
    }

    /// Configures a host cell for the item at `address`.
    pub fn configure_cell(&self, cell: &mut dyn Any, address: Address) -> Result<()> {
        let (item, descriptor) = self.inner.resolve(address)?;
        descriptor.configure(cell, &item, address)
    }

    /// Host notification: the row at `address` was selected.
    pub fn did_select_row(&self, address: Address) -> Result<()> {
        let item = self.inner.item_at(address)?;
        if let Some(owner) = self.inner.owner() {
            owner.row_selected(address, &item);
        }
        Ok(())
    }

    /// Host notification: `cell` is about to be shown at `address`.
    pub fn will_display(&self, cell: &mut dyn Any, address: Address) {
        if let Some(owner) = self.inner.owner() {
            owner.will_display(address, cell);
        }
    }

    /// Applies `script`, section-relative, to `section` of the host view.
    ///
    /// This is what section subscriptions call; it is public for hosts that
    /// drive changes themselves.
    pub fn on_edit_script(&self, section: usize, script: &EditScript) -> Result<()> {
        self.inner.apply_edit_script(section, script)
    }

    /// Reloads every section in the host, discarding cached sizes.
    pub fn reload_data(&self) {
        let count = {
            let mut sections = self.inner.sections.write();
            for attached in sections.iter_mut() {
                attached.host_rows = attached.section.len();
            }
            sections.len()
        };
        self.inner.invalidate_sizes(None);
        tracing::debug!(target: targets::COORDINATOR, sections = count, "reloading all sections");
        self.inner.host.reload_all(count);
    }
}

impl<H: HostView + 'static> Inner<H> {
    fn owner(&self) -> Option<Arc<dyn CoordinatorOwner>> {
        self.owner.read().as_ref().and_then(Weak::upgrade)
    }

    fn section(&self, index: usize) -> Result<Arc<dyn Section>> {
        self.sections
            .read()
            .get(index)
            .map(|attached| attached.section.clone())
            .ok_or_else(|| Error::invalid_address(Address::new(index, 0)))
    }

    fn item_at(&self, address: Address) -> Result<AnyItem> {
        self.section(address.section)?
            .item_at(address.row)
            .map_err(|_| Error::invalid_address(address))
    }

    fn resolve(&self, address: Address) -> Result<(AnyItem, RendererDescriptor)> {
        let item = self.item_at(address)?;
        let descriptor = self.registry.read().resolve(&item)?.clone();
        Ok((item, descriptor))
    }

    /// Subscription entry point; failures go to `batch_failed`.
    fn forward(&self, section: usize, script: &EditScript) {
        if let Err(err) = self.apply_edit_script(section, script) {
            tracing::error!(
                target: targets::COORDINATOR,
                section,
                error = %err,
                "batch not applied"
            );
            self.batch_failed.emit(err);
        }
    }

    #[tracing::instrument(
        skip(self, script),
        target = "rowsync::coordinator",
        level = "debug",
        fields(ops = script.len())
    )]
    fn apply_edit_script(&self, section: usize, script: &EditScript) -> Result<()> {
        let _span = PerfSpan::new(span_names::BATCH);

        let old_rows = self
            .sections
            .read()
            .get(section)
            .map(|attached| attached.host_rows)
            .ok_or_else(|| Error::invalid_address(Address::new(section, 0)))?;

        if script.is_empty() {
            return Ok(());
        }

        // The section already holds the new rows, whether or not the host
        // accepts the batch.
        self.invalidate_sizes(Some(section));

        let new_rows = (old_rows + script.insert_count()).checked_sub(script.delete_count());
        let batch = script.in_section(section);

        if self.config.verify_batches {
            let new_rows = new_rows.ok_or_else(|| {
                Error::inconsistent(
                    section,
                    format!(
                        "{} deletions but the host shows {old_rows} rows",
                        script.delete_count()
                    ),
                )
            })?;
            batch.validate(section, old_rows, new_rows)?;
        }

        self.host
            .apply_batch(&batch)
            .map_err(|rejection| Error::inconsistent(section, rejection.reason))?;

        if let Some(attached) = self.sections.write().get_mut(section) {
            attached.host_rows = new_rows.unwrap_or(0);
        }

        tracing::debug!(
            target: targets::COORDINATOR,
            section,
            old_rows,
            deletes = script.delete_count(),
            inserts = script.insert_count(),
            "applied batch"
        );
        Ok(())
    }

    fn invalidate_sizes(&self, section: Option<usize>) {
        let mut cache = self.size_cache.lock();
        match section {
            Some(section) => cache.retain(|address, _| address.section != section),
            None => cache.clear(),
        }
    }
}
