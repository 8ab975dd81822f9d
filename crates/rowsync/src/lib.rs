//! rowsync - keeps list views in sync with observable sections of items.
//!
//! Sections hold plain values. Whenever a section's content is replaced, the
//! difference between the old and new sequence is computed by value equality
//! and handed to the host view as one atomic batch of row deletions and
//! insertions. Items of unrelated types can share a list: each item type is
//! paired with a renderer that sizes its rows and configures its cells.
//!
//! # Example
//!
//! ```
//! use rowsync::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Table {
//!     log: Mutex<Vec<String>>,
//! }
//!
//! impl HostView for Table {
//!     fn reload_section(&self, section: usize) {
//!         self.log.lock().unwrap().push(format!("reload {section}"));
//!     }
//!
//!     fn apply_batch(&self, batch: &EditScript) -> Result<(), BatchRejected> {
//!         self.log.lock().unwrap().push(batch.to_string());
//!         Ok(())
//!     }
//! }
//!
//! #[derive(Debug, PartialEq)]
//! struct Contact(&'static str);
//!
//! #[derive(Default)]
//! struct ContactCell {
//!     title: String,
//! }
//!
//! let coordinator = UpdateCoordinator::new(Table::default());
//! coordinator
//!     .register(
//!         CellRenderer::<ContactCell, Contact>::new(|cell, contact, _| {
//!             cell.title = contact.0.to_string();
//!         })
//!         .with_height(|_| 56.0),
//!     )
//!     .unwrap();
//!
//! let contacts = Arc::new(SectionModel::new(vec![Contact("Ada"), Contact("Grace")]));
//! coordinator.add_section(contacts.clone());
//!
//! contacts.replace(vec![Contact("Grace"), Contact("Linus")]);
//!
//! assert_eq!(
//!     coordinator.host().log.lock().unwrap().as_slice(),
//!     ["reload 0", "[delete section 0, row 0; insert section 0, row 1]"]
//! );
//! assert_eq!(coordinator.size_for(Address::new(0, 1)).unwrap(), 56.0);
//! ```
//!
//! # Crate Layout
//!
//! - [`model`]: addresses, edit scripts, the diff engine, sections, the
//!   renderer registry and the update coordinator
//! - [`config`]: coordinator configuration loaded from TOML or JSON
//! - [`Signal`] and the logging helpers come from `rowsync-core`

pub mod config;
mod error;
pub mod model;

pub use config::CoordinatorConfig;
pub use error::{Error, Result};
pub use rowsync_core::*;

/// Commonly used types.
pub mod prelude {
    pub use crate::config::CoordinatorConfig;
    pub use crate::error::Error;
    pub use crate::model::{
        Address, AnyItem, BatchRejected, CellRenderer, ChangeOp, CoordinatorOwner, EditScript,
        HostView, RendererDescriptor, SectionModel, UpdateCoordinator, diff,
    };
    pub use rowsync_core::Signal;
}
