//! Conversion between domain objects and their marshalled byte form.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::{CacheWireError, Result};
use crate::serialization::{
    DataInput, DataOutput, FactoryRegistry, IdentifiedDataSerializable, ObjectDataInput,
    ObjectDataOutput,
};

/// Shared handle to a materialized key or value.
pub type DomainObject = Arc<dyn IdentifiedDataSerializable>;

/// Turns domain objects into bytes and back.
///
/// A context is shared read-only by every entry being marshalled, so
/// implementations must not keep per-entry state.
pub trait CacheObjectContext: Send + Sync {
    /// Produces the marshalled form of `object`.
    fn encode(&self, object: &dyn IdentifiedDataSerializable) -> Result<Bytes>;

    /// Materializes an object from `bytes`, resolving its type through `registry`.
    fn decode(&self, bytes: &[u8], registry: &FactoryRegistry) -> Result<DomainObject>;

    /// Returns the length of the marshalled form of `object`.
    fn encoded_length(&self, object: &dyn IdentifiedDataSerializable) -> Result<usize> {
        self.encode(object).map(|bytes| bytes.len())
    }
}

/// Size of the type prefix written by [`IdentifiedObjectContext`].
const TYPE_PREFIX_SIZE: usize = 8;

/// Context that prefixes each object with its factory and class IDs.
///
/// Layout: `factory_id: i32`, `class_id: i32`, then the object's payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentifiedObjectContext {
    initial_capacity: Option<usize>,
}

impl IdentifiedObjectContext {
    /// Creates a context with the default output capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that pre-sizes marshalling buffers.
    pub fn with_initial_capacity(capacity: usize) -> Self {
        Self {
            initial_capacity: Some(capacity),
        }
    }
}

impl CacheObjectContext for IdentifiedObjectContext {
    fn encode(&self, object: &dyn IdentifiedDataSerializable) -> Result<Bytes> {
        let mut output = match self.initial_capacity {
            Some(capacity) => ObjectDataOutput::with_capacity(capacity),
            None => ObjectDataOutput::new(),
        };

        output.write_int(object.factory_id())?;
        output.write_int(object.class_id())?;
        object.write_data(&mut output).map_err(|e| {
            CacheWireError::Marshal(format!(
                "failed to write object (factory {}, class {}): {}",
                object.factory_id(),
                object.class_id(),
                e
            ))
        })?;

        Ok(output.freeze())
    }

    fn decode(&self, bytes: &[u8], registry: &FactoryRegistry) -> Result<DomainObject> {
        if bytes.len() < TYPE_PREFIX_SIZE {
            return Err(CacheWireError::Unmarshal(format!(
                "marshalled object too short: {} bytes",
                bytes.len()
            )));
        }

        let mut input = ObjectDataInput::from_slice(bytes);
        let factory_id = input.read_int()?;
        let class_id = input.read_int()?;

        let mut object = registry.create(factory_id, class_id).ok_or_else(|| {
            debug!(factory_id, class_id, "no factory for marshalled type");
            CacheWireError::Unmarshal(format!(
                "cannot resolve type (factory {}, class {})",
                factory_id, class_id
            ))
        })?;

        object.read_data(&mut input).map_err(|e| {
            CacheWireError::Unmarshal(format!(
                "corrupt payload for type (factory {}, class {}): {}",
                factory_id, class_id, e
            ))
        })?;

        if input.remaining() > 0 {
            return Err(CacheWireError::Unmarshal(format!(
                "{} trailing bytes after object (factory {}, class {})",
                input.remaining(),
                factory_id,
                class_id
            )));
        }

        Ok(Arc::from(object))
    }
}
