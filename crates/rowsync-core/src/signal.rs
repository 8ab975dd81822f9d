//! Signal/slot system for rowsync.
//!
//! Signals are how every component in rowsync publishes change: a section
//! model publishes edit scripts, the coordinator publishes rejected batches.
//! Connected slots (callbacks) are invoked synchronously, on the emitting
//! thread, before `emit` returns.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Delivery Semantics
//!
//! Each emission delivers to exactly the slots connected at the moment the
//! emission starts. The connection table is snapshotted and the lock released
//! before any slot runs, so a slot may connect or disconnect on the same
//! signal (or emit it again) without deadlocking:
//!
//! - a slot connected during an emission does not observe that emission;
//! - a slot disconnected during an emission still receives it.
//!
//! Slots run in connection order.
//!
//! # Example
//!
//! ```
//! use rowsync_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello, World!".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    /// The slot function to invoke.
    slot: Slot<Args>,
    /// Monotonic connection order; slotmap reuses slots so iteration order
    /// alone does not reflect it.
    order: u64,
}

struct ConnectionTable<Args> {
    connections: SlotMap<ConnectionId, Connection<Args>>,
    next_order: u64,
}

impl<Args> ConnectionTable<Args> {
    fn new() -> Self {
        Self {
            connections: SlotMap::with_key(),
            next_order: 0,
        }
    }

    fn insert(&mut self, slot: Slot<Args>) -> ConnectionId {
        let order = self.next_order;
        self.next_order += 1;
        self.connections.insert(Connection { slot, order })
    }

    fn snapshot(&self) -> Vec<Slot<Args>> {
        let mut live: Vec<&Connection<Args>> = self.connections.values().collect();
        live.sort_by_key(|conn| conn.order);
        live.into_iter().map(|conn| conn.slot.clone()).collect()
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(usize, EditScript)` for several.
pub struct Signal<Args> {
    /// All active connections, shared with outstanding [`ConnectionGuard`]s.
    table: Arc<Mutex<ConnectionTable<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
    /// Number of emissions that reached at least the delivery stage.
    emissions: AtomicU64,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(ConnectionTable::new())),
            blocked: AtomicBool::new(false),
            emissions: AtomicU64::new(0),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use rowsync_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.table.lock().insert(Arc::new(slot))
    }

    /// Connect a slot with automatic disconnection when the guard is dropped.
    ///
    /// The guard only holds a weak handle to the connection table, so it may
    /// safely outlive the signal.
    pub fn connect_scoped<F>(&self, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            table: Arc::downgrade(&self.table),
            id,
        }
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.table.lock().connections.remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let removed = {
            let mut table = self.table.lock();
            let removed = table.connections.len();
            table.connections.clear();
            removed
        };
        crate::rowsync_debug!(removed, "disconnected all slots");
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.table.lock().connections.len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Number of emissions delivered so far (blocked emissions excluded).
    pub fn emission_count(&self) -> u64 {
        self.emissions.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking every slot connected at this moment.
    ///
    /// If the signal is blocked, this does nothing.
    #[tracing::instrument(skip_all, target = "rowsync_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots = self.table.lock().snapshot();
        self.emissions.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }
    }
}

static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

/// A connection guard that automatically disconnects when dropped.
///
/// Created via [`Signal::connect_scoped`].
///
/// # Example
///
/// ```
/// use rowsync_core::Signal;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use std::sync::Arc;
///
/// let signal = Signal::<i32>::new();
/// let counter = Arc::new(AtomicI32::new(0));
/// {
///     let counter_clone = counter.clone();
///     let _guard = signal.connect_scoped(move |&n| {
///         counter_clone.fetch_add(n, Ordering::SeqCst);
///     });
///     signal.emit(42);  // counter = 42
/// }
/// signal.emit(43);  // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
pub struct ConnectionGuard<Args> {
    table: Weak<Mutex<ConnectionTable<Args>>>,
    id: ConnectionId,
}

impl<Args> ConnectionGuard<Args> {
    /// The connection this guard owns.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Release the connection without disconnecting it.
    pub fn detach(mut self) -> ConnectionId {
        self.table = Weak::new();
        self.id
    }
}

impl<Args> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.lock().connections.remove(self.id);
        }
    }
}
