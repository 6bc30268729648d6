//! Cache-internal holders for keys and values.
//!
//! A cache object carries a materialized domain object, its marshalled
//! bytes, or both. Only the bytes travel on the wire; the object is
//! produced lazily from them when a conversion context is available.

use std::fmt;

use bytes::{Buf, BufMut, Bytes};

use crate::error::{CacheWireError, Result};
use crate::marshal::{CacheObjectContext, DomainObject};
use crate::protocol::constants::{CACHE_OBJECT_TYPE, KEY_CACHE_OBJECT_TYPE};
use crate::protocol::{ready_or_suspend, MessageReader, MessageWriter, WireMessage};
use crate::serialization::FactoryRegistry;

#[derive(Clone, Default)]
struct Payload {
    object: Option<DomainObject>,
    bytes: Option<Bytes>,
}

impl Payload {
    fn prepare_marshal(&mut self, ctx: &dyn CacheObjectContext) -> Result<()> {
        if self.bytes.is_some() {
            return Ok(());
        }
        let object = self.object.as_ref().ok_or_else(empty_object)?;
        self.bytes = Some(ctx.encode(object.as_ref()).map_err(as_marshal)?);
        Ok(())
    }

    fn marshalled_len(&self, ctx: &dyn CacheObjectContext) -> Result<usize> {
        match (&self.bytes, &self.object) {
            (Some(bytes), _) => Ok(bytes.len()),
            (None, Some(object)) => ctx.encoded_length(object.as_ref()).map_err(as_marshal),
            (None, None) => Err(empty_object()),
        }
    }

    fn finish_unmarshal(
        &mut self,
        ctx: &dyn CacheObjectContext,
        registry: &FactoryRegistry,
    ) -> Result<()> {
        if self.object.is_some() {
            return Ok(());
        }
        let bytes = self.bytes.as_ref().ok_or_else(empty_object)?;
        self.object = Some(ctx.decode(bytes, registry).map_err(as_unmarshal)?);
        Ok(())
    }

    fn write_fields<B: BufMut>(
        &self,
        buf: &mut B,
        writer: &mut MessageWriter,
        direct_type: i8,
    ) -> Result<bool> {
        let bytes = self.bytes.as_deref().ok_or_else(|| {
            CacheWireError::ContractViolation(
                "cache object must be marshalled before it is written".to_string(),
            )
        })?;

        if !writer.write_header_once(buf, direct_type, 1) {
            return Ok(false);
        }
        if writer.state() == 0 {
            if !writer.write_byte_array(buf, Some(bytes))? {
                return Ok(false);
            }
            writer.increment_state();
        }
        Ok(true)
    }

    fn read_fields<B: Buf>(&mut self, buf: &mut B, reader: &mut MessageReader) -> Result<bool> {
        ready_or_suspend!(reader.before_message_read(buf, 1)?);
        if reader.state() == 0 {
            let bytes = ready_or_suspend!(reader.read_byte_array(buf)?);
            self.bytes = Some(bytes.ok_or_else(|| {
                CacheWireError::Protocol("cache object arrived without bytes".to_string())
            })?);
            reader.increment_state();
        }
        Ok(true)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("object", &self.object)
            .field("bytes_len", &self.bytes.as_ref().map(Bytes::len))
            .finish()
    }
}

fn empty_object() -> CacheWireError {
    CacheWireError::ContractViolation("cache object holds neither an object nor bytes".to_string())
}

fn as_marshal(err: CacheWireError) -> CacheWireError {
    match err {
        CacheWireError::Marshal(_) | CacheWireError::ContractViolation(_) => err,
        other => CacheWireError::Marshal(other.to_string()),
    }
}

fn as_unmarshal(err: CacheWireError) -> CacheWireError {
    match err {
        CacheWireError::Unmarshal(_) | CacheWireError::ContractViolation(_) => err,
        other => CacheWireError::Unmarshal(other.to_string()),
    }
}

macro_rules! cache_object {
    ($(#[$meta:meta])* $name:ident, $direct_type:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default)]
        pub struct $name {
            inner: Payload,
        }

        impl $name {
            /// Wraps a materialized object; bytes are produced on marshal.
            pub fn from_object(object: DomainObject) -> Self {
                Self {
                    inner: Payload {
                        object: Some(object),
                        bytes: None,
                    },
                }
            }

            /// Wraps marshalled bytes; the object is produced on unmarshal.
            pub fn from_bytes(bytes: Bytes) -> Self {
                Self {
                    inner: Payload {
                        object: None,
                        bytes: Some(bytes),
                    },
                }
            }

            /// Wraps an object together with bytes already known to encode it.
            pub fn from_parts(object: DomainObject, bytes: Bytes) -> Self {
                Self {
                    inner: Payload {
                        object: Some(object),
                        bytes: Some(bytes),
                    },
                }
            }

            /// Returns the materialized object, if any.
            pub fn object(&self) -> Option<&DomainObject> {
                self.inner.object.as_ref()
            }

            /// Returns the marshalled bytes, if any.
            pub fn bytes(&self) -> Option<&Bytes> {
                self.inner.bytes.as_ref()
            }

            /// Returns `true` if the bytes needed on the wire are present.
            pub fn is_marshalled(&self) -> bool {
                self.inner.bytes.is_some()
            }

            /// Drops the marshalled bytes, keeping the object.
            ///
            /// Has no effect when there is no object to re-create them from.
            pub fn clear_bytes(&mut self) {
                if self.inner.object.is_some() {
                    self.inner.bytes = None;
                }
            }

            /// Produces the marshalled bytes from the object if missing.
            pub fn prepare_marshal(&mut self, ctx: &dyn CacheObjectContext) -> Result<()> {
                self.inner.prepare_marshal(ctx)
            }

            /// Returns the length of the marshalled bytes without storing them.
            pub fn marshalled_len(&self, ctx: &dyn CacheObjectContext) -> Result<usize> {
                self.inner.marshalled_len(ctx)
            }

            /// Materializes the object from the bytes if missing.
            pub fn finish_unmarshal(
                &mut self,
                ctx: &dyn CacheObjectContext,
                registry: &FactoryRegistry,
            ) -> Result<()> {
                self.inner.finish_unmarshal(ctx, registry)
            }
        }

        impl WireMessage for $name {
            const DIRECT_TYPE: i8 = $direct_type;
            const FIELDS_COUNT: u8 = 1;

            fn write_to<B: BufMut>(&self, buf: &mut B, writer: &mut MessageWriter) -> Result<bool> {
                self.inner.write_fields(buf, writer, Self::DIRECT_TYPE)
            }

            fn read_from<B: Buf>(&mut self, buf: &mut B, reader: &mut MessageReader) -> Result<bool> {
                self.inner.read_fields(buf, reader)
            }
        }
    };
}

cache_object!(
    /// Holder for an entry key.
    KeyCacheObject,
    KEY_CACHE_OBJECT_TYPE
);

cache_object!(
    /// Holder for an entry value.
    CacheObject,
    CACHE_OBJECT_TYPE
);
