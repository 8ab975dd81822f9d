//! Sections, diffs and the coordinator that keeps a host view in sync.
//!
//! # Core Types
//!
//! - `Address`: a (section, row) pair naming one item
//! - `ChangeOp` / `EditScript`: the insertions and deletions between two
//!   versions of a section
//! - `diff`: the equality-based diff engine producing edit scripts
//! - `SectionModel`: an observable sequence that publishes an edit script on
//!   every change
//! - `CellRenderer` / `RendererRegistry`: per-item-type sizing and cell
//!   configuration, dispatched by runtime type
//! - `UpdateCoordinator`: forwards section changes to a `HostView` as atomic
//!   batches and answers its row queries
//!
//! # Architecture Overview
//!
//! ```text
//! ┌──────────────┐ EditScript ┌───────────────────┐  batch   ┌──────────┐
//! │ SectionModel │───────────>│ UpdateCoordinator │─────────>│ HostView │
//! └──────────────┘  (signal)  │                   │<─────────│          │
//!                             │ RendererRegistry  │ queries  └──────────┘
//!                             └───────────────────┘
//!                                       │ events
//!                                       v
//!                              CoordinatorOwner (weak)
//! ```

mod address;
mod change;
mod coordinator;
mod diff;
mod registry;
mod section;
mod traits;

pub use address::Address;
pub use change::{ChangeKind, ChangeOp, EditScript};
pub use coordinator::UpdateCoordinator;
pub use diff::diff;
pub use registry::{
    AnyItem, CellRenderer, CellType, DEFAULT_ROW_HEIGHT, RendererDescriptor, RendererKey,
    RendererRegistry,
};
pub use section::SectionModel;
pub use traits::{BatchRejected, CoordinatorOwner, HostView, Section};
