//! Lazy conversion of entry keys and values between objects and bytes.

use tracing::{debug, error};

use super::cache_object::KeyCacheObject;
use super::info::{EntryInfo, EntryKey};
use crate::config::{CodecConfig, KeyBytesPolicy};
use crate::error::{CacheWireError, Result};
use crate::marshal::CacheObjectContext;
use crate::serialization::FactoryRegistry;

impl EntryInfo {
    /// Produces the byte form of the key and value so the entry can be encoded.
    ///
    /// Byte forms already present are kept as they are.
    pub fn prepare_for_wire(&mut self, ctx: &dyn CacheObjectContext) -> Result<()> {
        let cache_id = self.cache_id;
        match self.key.as_mut() {
            None => return Err(missing_key(cache_id)),
            Some(EntryKey::Decoded(key)) => key.prepare_marshal(ctx)?,
            Some(EntryKey::Raw(_)) => {}
        }
        if let Some(value) = self.value.as_mut() {
            value.prepare_marshal(ctx)?;
        }

        debug!(cache_id, tombstone = self.value.is_none(), "entry prepared for wire");
        Ok(())
    }

    /// Returns the combined length of the key and value payloads.
    ///
    /// Missing byte forms are measured through `ctx` without being stored.
    pub fn wire_size(&self, ctx: &dyn CacheObjectContext) -> Result<usize> {
        let key_len = match &self.key {
            None => return Err(missing_key(self.cache_id)),
            Some(EntryKey::Raw(bytes)) => bytes.len(),
            Some(EntryKey::Decoded(key)) => key.marshalled_len(ctx)?,
        };
        let value_len = match &self.value {
            Some(value) => value.marshalled_len(ctx)?,
            None => 0,
        };
        Ok(key_len + value_len)
    }

    /// Materializes the key and value objects of a received entry.
    ///
    /// Raw key bytes become a key object; the key bytes policy of `config`
    /// decides whether the bytes stay inside it.
    pub fn materialize_from_wire(
        &mut self,
        ctx: &dyn CacheObjectContext,
        registry: &FactoryRegistry,
        config: &CodecConfig,
    ) -> Result<()> {
        let cache_id = self.cache_id;
        let policy = config.key_bytes_policy();
        let mut key = match self.key.take() {
            None => return Err(missing_key(cache_id)),
            Some(EntryKey::Raw(bytes)) => KeyCacheObject::from_bytes(bytes),
            Some(EntryKey::Decoded(key)) => key,
        };
        let result = key.finish_unmarshal(ctx, registry);
        if result.is_ok() && policy == KeyBytesPolicy::Clear {
            key.clear_bytes();
        }
        self.key = Some(EntryKey::Decoded(key));
        result?;

        if let Some(value) = self.value.as_mut() {
            value.finish_unmarshal(ctx, registry)?;
        }

        debug!(cache_id, ?policy, "entry materialized from wire");
        Ok(())
    }
}

fn missing_key(cache_id: i32) -> CacheWireError {
    error!(cache_id, "entry has neither a key nor key bytes");
    CacheWireError::ContractViolation("entry has neither a key nor key bytes".to_string())
}
