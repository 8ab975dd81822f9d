//! Renderer registration and type-erased dispatch.
//!
//! Items of unrelated types share one list without a common base type. Each
//! item type is paired with exactly one renderer: a [`CellRenderer<C, T>`]
//! that knows how to size an item of type `T` and configure a host cell of
//! type `C`. Registering it erases both types into a [`RendererDescriptor`],
//! keyed by the item's [`RendererKey`]; lookups go through the item's runtime
//! type identity.
//!
//! This is the only place where rowsync downcasts. Everything in front of the
//! registry works with statically typed items and cells.
//!
//! # Example
//!
//! ```
//! use rowsync::model::{Address, AnyItem, CellRenderer, RendererRegistry};
//! use std::sync::Arc;
//!
//! #[derive(PartialEq)]
//! struct Contact { name: String }
//! #[derive(Default)]
//! struct LabelCell { text: String }
//!
//! let mut registry = RendererRegistry::new();
//! registry
//!     .register(
//!         CellRenderer::<LabelCell, Contact>::new(|cell, contact, _address| {
//!             cell.text = contact.name.clone();
//!         })
//!         .with_height(|_| 44.0),
//!     )
//!     .unwrap();
//!
//! let item = AnyItem::new(Arc::new(Contact { name: "Ada".into() }));
//! let mut cell = LabelCell::default();
//! registry.configure(&mut cell, &item, Address::new(0, 0)).unwrap();
//! assert_eq!(cell.text, "Ada");
//! assert_eq!(registry.size_for(&item).unwrap(), 44.0);
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use rowsync_core::logging::targets;

use super::address::Address;
use crate::error::{Error, Result};

/// Row height used when a renderer has no height function.
pub const DEFAULT_ROW_HEIGHT: f32 = 30.0;

/// Identifies a renderer by the runtime type of the items it renders.
///
/// Equality and hashing use only the `TypeId`; the type name is carried for
/// diagnostics.
#[derive(Clone, Copy)]
pub struct RendererKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl RendererKey {
    /// The key for items of type `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The item type's `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The item type's name, as reported by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl PartialEq for RendererKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for RendererKey {}

impl Hash for RendererKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for RendererKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RendererKey").field(&self.type_name).finish()
    }
}

/// The host cell type a renderer configures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellType {
    type_id: TypeId,
    type_name: &'static str,
}

impl CellType {
    /// The cell type `C`.
    pub fn of<C: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
        }
    }

    /// The cell type's `TypeId`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The cell type's name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

type ErasedEq = fn(&(dyn Any + Send + Sync), &(dyn Any + Send + Sync)) -> bool;

fn eq_as<T: Any + PartialEq>(a: &(dyn Any + Send + Sync), b: &(dyn Any + Send + Sync)) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// A shared, type-erased item handed out by sections.
///
/// Cloning is cheap (one `Arc` increment). The renderer key is captured when
/// the item is erased, so lookups never have to guess at the concrete type.
///
/// Two items are equal when they have the same concrete type and equal
/// values, so a `SectionModel<AnyItem>` diffs a list of mixed item types.
#[derive(Clone)]
pub struct AnyItem {
    value: Arc<dyn Any + Send + Sync>,
    key: RendererKey,
    eq: ErasedEq,
}

impl AnyItem {
    /// Erases a shared item.
    pub fn new<T: Any + PartialEq + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            key: RendererKey::of::<T>(),
            eq: eq_as::<T>,
        }
    }

    /// Erases an owned item.
    pub fn from_value<T: Any + PartialEq + Send + Sync>(value: T) -> Self {
        Self::new(Arc::new(value))
    }

    /// The renderer key of the item's concrete type.
    pub fn key(&self) -> RendererKey {
        self.key
    }

    /// Returns `true` if the item is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.key.type_id == TypeId::of::<T>()
    }

    /// Borrows the item as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.value).downcast_ref::<T>()
    }

    /// Recovers the shared `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast::<T>().ok()
    }
}

impl PartialEq for AnyItem {
    fn eq(&self, other: &Self) -> bool {
        self.key.type_id == other.key.type_id && (self.eq)(&*self.value, &*other.value)
    }
}

impl fmt::Debug for AnyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyItem")
            .field("type", &self.key.type_name)
            .finish_non_exhaustive()
    }
}

type TypedConfigure<C, T> = Arc<dyn Fn(&mut C, &T, Address) + Send + Sync>;
type TypedHeight<T> = Arc<dyn Fn(&T) -> f32 + Send + Sync>;
type ErasedConfigure = Arc<dyn Fn(&mut dyn Any, &AnyItem, Address) -> Result<()> + Send + Sync>;
type ErasedHeight = Arc<dyn Fn(&AnyItem) -> Option<f32> + Send + Sync>;

/// A strongly typed renderer for items `T` shown in host cells `C`.
///
/// Build one per item type and hand it to
/// [`RendererRegistry::register`], which erases it.
pub struct CellRenderer<C, T> {
    reuse_id: Option<String>,
    height: Option<TypedHeight<T>>,
    configure: TypedConfigure<C, T>,
    _cell: PhantomData<fn(&mut C)>,
}

impl<C: 'static, T: Send + Sync + 'static> CellRenderer<C, T> {
    /// Creates a renderer from its configure function.
    ///
    /// The reuse identifier defaults to the item type's name.
    pub fn new<F>(configure: F) -> Self
    where
        F: Fn(&mut C, &T, Address) + Send + Sync + 'static,
    {
        Self {
            reuse_id: None,
            height: None,
            configure: Arc::new(configure),
            _cell: PhantomData,
        }
    }

    /// Sets the per-item height function.
    pub fn with_height<F>(mut self, height: F) -> Self
    where
        F: Fn(&T) -> f32 + Send + Sync + 'static,
    {
        self.height = Some(Arc::new(height));
        self
    }

    /// Overrides the reuse identifier the host constructs cells under.
    pub fn with_reuse_id(mut self, reuse_id: impl Into<String>) -> Self {
        self.reuse_id = Some(reuse_id.into());
        self
    }

    /// Erases the cell and item types.
    pub fn into_descriptor(self) -> RendererDescriptor {
        let key = RendererKey::of::<T>();
        let reuse_id = self
            .reuse_id
            .unwrap_or_else(|| key.type_name().to_string());
        let cell_type = CellType::of::<C>();

        let typed_configure = self.configure;
        let configure_reuse_id = reuse_id.clone();
        let configure: ErasedConfigure = Arc::new(
            move |cell: &mut dyn Any, item: &AnyItem, address: Address| -> Result<()> {
                let cell = cell
                    .downcast_mut::<C>()
                    .ok_or_else(|| Error::CellTypeMismatch {
                        reuse_id: configure_reuse_id.clone(),
                        expected: cell_type.type_name(),
                    })?;
                let item = item
                    .downcast_ref::<T>()
                    .ok_or_else(|| Error::renderer_not_found(item.key().type_name()))?;
                typed_configure(cell, item, address);
                Ok(())
            },
        );

        let height = self.height.map(|typed| -> ErasedHeight {
            Arc::new(move |item: &AnyItem| item.downcast_ref::<T>().map(|item| typed(item)))
        });

        RendererDescriptor {
            key,
            reuse_id,
            cell_type,
            height,
            configure,
        }
    }
}

impl<C: 'static, T: Send + Sync + 'static> From<CellRenderer<C, T>> for RendererDescriptor {
    fn from(renderer: CellRenderer<C, T>) -> Self {
        renderer.into_descriptor()
    }
}

/// A registered renderer with its types erased.
///
/// Cloning is cheap; the functions are shared.
#[derive(Clone)]
pub struct RendererDescriptor {
    key: RendererKey,
    reuse_id: String,
    cell_type: CellType,
    height: Option<ErasedHeight>,
    configure: ErasedConfigure,
}

impl RendererDescriptor {
    /// The key this descriptor is registered under.
    pub fn key(&self) -> RendererKey {
        self.key
    }

    /// The identifier hosts construct and recycle cells under.
    pub fn reuse_id(&self) -> &str {
        &self.reuse_id
    }

    /// The host cell type this renderer configures.
    pub fn cell_type(&self) -> CellType {
        self.cell_type
    }

    /// Returns `true` if the renderer supplies its own row heights.
    pub fn has_height(&self) -> bool {
        self.height.is_some()
    }

    /// The renderer's height for `item`, if it has a height function and the
    /// item is of its type.
    pub fn height_for(&self, item: &AnyItem) -> Option<f32> {
        self.height.as_ref().and_then(|height| height(item))
    }

    /// Configures `cell` to display `item` at `address`.
    pub fn configure(&self, cell: &mut dyn Any, item: &AnyItem, address: Address) -> Result<()> {
        (self.configure)(cell, item, address)
    }
}

impl fmt::Debug for RendererDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererDescriptor")
            .field("key", &self.key)
            .field("reuse_id", &self.reuse_id)
            .field("cell_type", &self.cell_type.type_name)
            .field("has_height", &self.height.is_some())
            .finish()
    }
}

/// Write-once mapping from renderer key to descriptor.
#[derive(Debug)]
pub struct RendererRegistry {
    descriptors: HashMap<RendererKey, RendererDescriptor>,
    default_row_height: f32,
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererRegistry {
    /// Creates an empty registry using [`DEFAULT_ROW_HEIGHT`].
    pub fn new() -> Self {
        Self::with_default_row_height(DEFAULT_ROW_HEIGHT)
    }

    /// Creates an empty registry with a custom fallback row height.
    pub fn with_default_row_height(default_row_height: f32) -> Self {
        Self {
            descriptors: HashMap::new(),
            default_row_height,
        }
    }

    /// Registers a renderer.
    ///
    /// Fails with [`Error::DuplicateRendererKey`] if the item type already
    /// has one; the existing registration stays active.
    pub fn register(
        &mut self,
        descriptor: impl Into<RendererDescriptor>,
    ) -> Result<&RendererDescriptor> {
        let descriptor = descriptor.into();
        let key = descriptor.key();

        if self.descriptors.contains_key(&key) {
            tracing::warn!(
                target: targets::REGISTRY,
                item_type = key.type_name(),
                "rejected duplicate renderer registration"
            );
            return Err(Error::duplicate_renderer(key.type_name()));
        }

        tracing::debug!(
            target: targets::REGISTRY,
            item_type = key.type_name(),
            reuse_id = descriptor.reuse_id(),
            "registered renderer"
        );
        Ok(self.descriptors.entry(key).or_insert(descriptor))
    }

    /// Looks up the renderer for `item`'s runtime type.
    pub fn resolve(&self, item: &AnyItem) -> Result<&RendererDescriptor> {
        self.resolve_key(item.key())
    }

    /// Looks up the renderer registered under `key`.
    pub fn resolve_key(&self, key: RendererKey) -> Result<&RendererDescriptor> {
        self.descriptors.get(&key).ok_or_else(|| {
            tracing::warn!(
                target: targets::REGISTRY,
                item_type = key.type_name(),
                "no renderer registered"
            );
            Error::renderer_not_found(key.type_name())
        })
    }

    /// Row height for `item`: the renderer's height function, or the
    /// registry's default row height when it has none.
    pub fn size_for(&self, item: &AnyItem) -> Result<f32> {
        let descriptor = self.resolve(item)?;
        Ok(descriptor
            .height_for(item)
            .unwrap_or(self.default_row_height))
    }

    /// Configures `cell` for `item` through the item's renderer.
    pub fn configure(&self, cell: &mut dyn Any, item: &AnyItem, address: Address) -> Result<()> {
        self.resolve(item)?.configure(cell, item, address)
    }

    /// The fallback row height.
    pub fn default_row_height(&self) -> f32 {
        self.default_row_height
    }

    /// Returns `true` if items of type `T` have a renderer.
    pub fn contains<T: 'static>(&self) -> bool {
        self.descriptors.contains_key(&RendererKey::of::<T>())
    }

    /// Number of registered renderers.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates over the registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = RendererKey> + '_ {
        self.descriptors.keys().copied()
    }
}

static_assertions::assert_impl_all!(RendererDescriptor: Send, Sync, Clone);
static_assertions::assert_impl_all!(AnyItem: Send, Sync, Clone);
