//! Entry versions used for conflict resolution.

use std::cmp::Ordering;
use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::Result;
use crate::protocol::constants::CACHE_VERSION_TYPE;
use crate::protocol::{ready_or_suspend, MessageReader, MessageWriter, WireMessage};

const NODE_ORDER_MASK: i32 = 0x07FF_FFFF;
const DR_ID_SHIFT: u32 = 27;
const DR_ID_MASK: i32 = 0x1F;

/// Largest node order that fits next to a data center ID.
pub const MAX_NODE_ORDER: i32 = NODE_ORDER_MASK;

/// Largest data center ID.
pub const MAX_DATA_CENTER_ID: u8 = DR_ID_MASK as u8;

/// Version assigned to an entry by the node that last updated it.
///
/// The node order and data center ID share one 32-bit word on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheVersion {
    topology_version: i32,
    node_order_dr_id: i32,
    global_time: i64,
    order: i64,
}

impl CacheVersion {
    /// Creates a version for data center 0.
    pub fn new(topology_version: i32, global_time: i64, order: i64, node_order: i32) -> Self {
        Self::with_data_center(topology_version, global_time, order, node_order, 0)
    }

    /// Creates a version tagged with a data center ID.
    ///
    /// `node_order` is truncated to [`MAX_NODE_ORDER`] and
    /// `data_center_id` to [`MAX_DATA_CENTER_ID`].
    pub fn with_data_center(
        topology_version: i32,
        global_time: i64,
        order: i64,
        node_order: i32,
        data_center_id: u8,
    ) -> Self {
        let dr = (i32::from(data_center_id) & DR_ID_MASK) << DR_ID_SHIFT;
        Self {
            topology_version,
            node_order_dr_id: (node_order & NODE_ORDER_MASK) | dr,
            global_time,
            order,
        }
    }

    /// Returns the topology version the entry was updated in.
    pub fn topology_version(&self) -> i32 {
        self.topology_version
    }

    /// Returns the order of the updating node within the topology.
    pub fn node_order(&self) -> i32 {
        self.node_order_dr_id & NODE_ORDER_MASK
    }

    /// Returns the data center ID of the updating node.
    pub fn data_center_id(&self) -> u8 {
        ((self.node_order_dr_id >> DR_ID_SHIFT) & DR_ID_MASK) as u8
    }

    /// Returns the cluster-wide time of the update.
    pub fn global_time(&self) -> i64 {
        self.global_time
    }

    /// Returns the per-node update counter.
    pub fn order(&self) -> i64 {
        self.order
    }

    /// Compares two versions by topology version, then order, then node order.
    ///
    /// Global time and data center ID do not take part in ordering.
    pub fn compare_order(&self, other: &Self) -> Ordering {
        self.topology_version
            .cmp(&other.topology_version)
            .then(self.order.cmp(&other.order))
            .then(self.node_order().cmp(&other.node_order()))
    }

    /// Returns `true` if this version supersedes `other`.
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self.compare_order(other) == Ordering::Greater
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{}:{}:{}",
            self.topology_version,
            self.order,
            self.node_order()
        )?;
        if self.data_center_id() != 0 {
            write!(f, "@dc{}", self.data_center_id())?;
        }
        Ok(())
    }
}

impl WireMessage for CacheVersion {
    const DIRECT_TYPE: i8 = CACHE_VERSION_TYPE;
    const FIELDS_COUNT: u8 = 4;

    fn write_to<B: BufMut>(&self, buf: &mut B, writer: &mut MessageWriter) -> Result<bool> {
        if !writer.write_header_once(buf, Self::DIRECT_TYPE, Self::FIELDS_COUNT) {
            return Ok(false);
        }

        loop {
            let done = match writer.state() {
                0 => writer.write_long(buf, self.global_time),
                1 => writer.write_int(buf, self.node_order_dr_id),
                2 => writer.write_long(buf, self.order),
                3 => writer.write_int(buf, self.topology_version),
                _ => return Ok(true),
            };
            if !done {
                return Ok(false);
            }
            writer.increment_state();
        }
    }

    fn read_from<B: Buf>(&mut self, buf: &mut B, reader: &mut MessageReader) -> Result<bool> {
        ready_or_suspend!(reader.before_message_read(buf, Self::FIELDS_COUNT)?);

        loop {
            match reader.state() {
                0 => self.global_time = ready_or_suspend!(reader.read_long(buf)),
                1 => self.node_order_dr_id = ready_or_suspend!(reader.read_int(buf)),
                2 => self.order = ready_or_suspend!(reader.read_long(buf)),
                3 => self.topology_version = ready_or_suspend!(reader.read_int(buf)),
                _ => return Ok(true),
            }
            reader.increment_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_order_and_data_center_packing() {
        let version = CacheVersion::with_data_center(3, 1000, 42, 17, 5);
        assert_eq!(version.node_order(), 17);
        assert_eq!(version.data_center_id(), 5);
        assert_eq!(version.topology_version(), 3);
        assert_eq!(version.global_time(), 1000);
        assert_eq!(version.order(), 42);
    }

    #[test]
    fn test_max_values_pack() {
        let version =
            CacheVersion::with_data_center(1, 0, 0, MAX_NODE_ORDER, MAX_DATA_CENTER_ID);
        assert_eq!(version.node_order(), MAX_NODE_ORDER);
        assert_eq!(version.data_center_id(), MAX_DATA_CENTER_ID);
    }

    #[test]
    fn test_ordering_ignores_global_time() {
        let a = CacheVersion::new(1, 500, 10, 1);
        let b = CacheVersion::new(1, 100, 10, 1);
        assert_eq!(a.compare_order(&b), Ordering::Equal);
        assert_ne!(a, b);
    }

    #[test]
    fn test_ordering_precedence() {
        let base = CacheVersion::new(2, 0, 10, 5);
        assert!(CacheVersion::new(3, 0, 1, 1).is_newer_than(&base));
        assert!(CacheVersion::new(2, 0, 11, 1).is_newer_than(&base));
        assert!(CacheVersion::new(2, 0, 10, 6).is_newer_than(&base));
        assert!(!base.is_newer_than(&base));
    }

    #[test]
    fn test_display() {
        assert_eq!(CacheVersion::new(4, 0, 9, 2).to_string(), "v4:9:2");
        assert_eq!(
            CacheVersion::with_data_center(4, 0, 9, 2, 3).to_string(),
            "v4:9:2@dc3"
        );
    }

    #[test]
    fn test_wire_layout() {
        let version = CacheVersion::new(0x0A, 0x0102, 0x0304, 0x05);
        let mut writer = MessageWriter::new();
        let mut out: Vec<u8> = Vec::new();
        assert!(writer.write(&mut out, &version).unwrap());
        assert_eq!(
            out,
            vec![
                86, 4, // header
                0, 0, 0, 0, 0, 0, 0x01, 0x02, // global time
                0, 0, 0, 0x05, // node order
                0, 0, 0, 0, 0, 0, 0x03, 0x04, // order
                0, 0, 0, 0x0A, // topology version
            ]
        );
    }

    #[test]
    fn test_read_one_byte_at_a_time() {
        let version = CacheVersion::with_data_center(7, -1, i64::MAX, 99, 1);
        let mut writer = MessageWriter::new();
        let mut out: Vec<u8> = Vec::new();
        writer.write(&mut out, &version).unwrap();

        let mut reader = MessageReader::default();
        let mut decoded = CacheVersion::default();
        let mut done = false;
        for byte in &out {
            let mut chunk: &[u8] = std::slice::from_ref(byte);
            done = reader.read(&mut chunk, &mut decoded).unwrap();
        }
        assert!(done);
        assert_eq!(decoded, version);
    }
}
