//! Direct message protocol with resumable, field-granular encoding.
//!
//! Messages are written as a two-byte header (type tag, field count)
//! followed by their fields in a fixed order. Nested messages carry their
//! own header, or a single null-marker byte when absent. All integers are
//! big-endian.

pub mod constants;
mod message;
mod reader;
mod writer;

pub use message::WireMessage;
pub(crate) use message::ready_or_suspend;
pub use reader::MessageReader;
pub use writer::MessageWriter;
