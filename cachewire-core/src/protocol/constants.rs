//! Constants of the direct message wire format.

/// Size of a message header in bytes (type tag + field count).
pub const MESSAGE_HEADER_SIZE: usize = 2;

/// Type tag written in place of an absent nested message.
pub const NULL_MESSAGE_TYPE: i8 = i8::MIN;

/// Size of a byte array length prefix.
pub const ARRAY_LENGTH_SIZE: usize = 4;

/// Length prefix of an absent byte array.
pub const NULL_ARRAY_LENGTH: i32 = -1;

/// Default upper bound for a single byte array on the wire (64 MiB).
pub const DEFAULT_MAX_BYTE_ARRAY_LEN: usize = 64 * 1024 * 1024;

// Message type tags.

/// Entry info record.
pub const ENTRY_INFO_TYPE: i8 = 91;

/// Key cache object.
pub const KEY_CACHE_OBJECT_TYPE: i8 = 90;

/// Value cache object.
pub const CACHE_OBJECT_TYPE: i8 = 89;

/// Cache entry version.
pub const CACHE_VERSION_TYPE: i8 = 86;
