//! Identified domain objects and the registry used to resolve them.
//!
//! Keys and values stored in a cache are domain objects identified on the
//! wire by a `(factory_id, class_id)` pair. A [`FactoryRegistry`] plays the
//! role of the type loader: given the pair it produces an empty instance
//! that then reads its own payload.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use super::{DataInput, DataOutput};
use crate::error::Result;

/// A domain object that can be marshalled into a cache object's byte form.
pub trait IdentifiedDataSerializable: fmt::Debug + Send + Sync {
    /// Returns the factory ID for this type.
    fn factory_id(&self) -> i32;

    /// Returns the class ID for this type within its factory.
    fn class_id(&self) -> i32;

    /// Writes the object's payload.
    fn write_data(&self, output: &mut dyn DataOutput) -> Result<()>;

    /// Reads the object's payload into this instance.
    fn read_data(&mut self, input: &mut dyn DataInput) -> Result<()>;

    /// Returns `self` as `Any` so callers can downcast to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl dyn IdentifiedDataSerializable {
    /// Downcasts to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Creates empty instances for all class IDs sharing one factory ID.
pub trait DataSerializableFactory: Send + Sync {
    /// Returns `None` if the class ID is not recognized by this factory.
    fn create(&self, class_id: i32) -> Option<Box<dyn IdentifiedDataSerializable>>;
}

/// Maps factory IDs to factories.
///
/// The registry is only read while unmarshalling, so a single instance can
/// be shared by every in-flight entry.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: HashMap<i32, Box<dyn DataSerializableFactory>>,
}

impl FactoryRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers a factory, replacing any previous one with the same ID.
    pub fn register(&mut self, factory_id: i32, factory: Box<dyn DataSerializableFactory>) {
        self.factories.insert(factory_id, factory);
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_factory(mut self, factory_id: i32, factory: Box<dyn DataSerializableFactory>) -> Self {
        self.register(factory_id, factory);
        self
    }

    /// Creates an empty instance for the given type, if it can be resolved.
    pub fn create(
        &self,
        factory_id: i32,
        class_id: i32,
    ) -> Option<Box<dyn IdentifiedDataSerializable>> {
        self.factories.get(&factory_id)?.create(class_id)
    }

    /// Returns `true` if a factory is registered for the given factory ID.
    pub fn contains(&self, factory_id: i32) -> bool {
        self.factories.contains_key(&factory_id)
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.factories.keys().copied().collect();
        ids.sort_unstable();
        f.debug_struct("FactoryRegistry")
            .field("factory_ids", &ids)
            .finish()
    }
}
