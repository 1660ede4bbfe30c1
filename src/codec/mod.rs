//! Encoder and decoder.
//!
//! # Encoding
//! Walks the list head-to-tail.  Each node's traversal position is its
//! index; cross-references are written as the index of their target, or
//! [`NO_CROSS`] when absent.  Every length is validated before the first
//! byte goes out, so a list the format cannot express never produces a
//! partial stream.  A short write after that point is terminal.
//!
//! # Decoding
//! Always a full replace: the target list is cleared first.  Records are
//! read into a flat buffer, then the chain is implied by read order and
//! cross indices are resolved against the final count.  Out-of-range cross
//! indices become "no cross-reference".  A short read is terminal and leaves
//! the list empty.
//!
//! # Allocation
//! Declared counts and payload lengths are not trusted for pre-allocation
//! (see [`PREALLOC_CAP`]).  Callers that want hard limits set them through
//! [`DecodeOptions`].

use std::io::{self, Cursor, Read, Write};

use thiserror::Error;
use tracing::{debug, trace};

use crate::index::{self, MAX_ADDRESSABLE, NO_CROSS};
use crate::list::{List, Node};
use crate::record::{read_count, write_count, NodeRecord, PREALLOC_CAP};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("List has {count} nodes; at most {max} can be addressed by a cross index", max = MAX_ADDRESSABLE)]
    TooManyNodes { count: usize },
    #[error("Payload of node {index} is {len} bytes; the format allows at most {max}", max = u32::MAX)]
    PayloadTooLarge { index: usize, len: usize },
    #[error("Declared node count {declared} exceeds limit {limit}")]
    CountLimit { declared: u32, limit: u32 },
    #[error("Node {index} declares a {declared}-byte payload, limit is {limit}")]
    PayloadLimit { index: u32, declared: u32, limit: u32 },
}

impl CodecError {
    /// True for a short read / short write, as opposed to a format or limit violation.
    pub fn is_io(&self) -> bool {
        matches!(self, CodecError::Io(_))
    }
}

// ── DecodeOptions ────────────────────────────────────────────────────────────

/// Limits applied while decoding.  The default is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub max_count:       Option<u32>,
    pub max_payload_len: Option<u32>,
}

impl DecodeOptions {
    pub fn with_max_count(mut self, limit: u32) -> Self {
        self.max_count = Some(limit);
        self
    }

    pub fn with_max_payload_len(mut self, limit: u32) -> Self {
        self.max_payload_len = Some(limit);
        self
    }
}

// ── Encoder ──────────────────────────────────────────────────────────────────

pub fn encode<W: Write>(list: &List, mut writer: W) -> Result<(), CodecError> {
    let nodes = list.nodes();
    let count = nodes.len();
    if count > MAX_ADDRESSABLE {
        return Err(CodecError::TooManyNodes { count });
    }
    if let Some((index, node)) = nodes.iter().enumerate()
        .find(|(_, n)| u32::try_from(n.payload.len()).is_err())
    {
        return Err(CodecError::PayloadTooLarge { index, len: node.payload.len() });
    }

    debug!(count, "encoding list");
    write_count(&mut writer, count as u32)?;

    // Storage order is traversal order, so a node's cross target is already
    // its index.
    let mut bytes = 4usize;
    for node in nodes {
        let cross = index::to_wire(node.cross).ok_or(CodecError::TooManyNodes { count })?;
        NodeRecord::write(&node.payload, cross, &mut writer)?;
        bytes += 8 + node.payload.len();
    }

    debug!(count, bytes, "encoded list");
    Ok(())
}

// ── Decoder ──────────────────────────────────────────────────────────────────

pub fn decode<R: Read>(list: &mut List, reader: R) -> Result<(), CodecError> {
    decode_with(list, reader, &DecodeOptions::default())
}

pub fn decode_with<R: Read>(
    list:    &mut List,
    mut reader: R,
    options: &DecodeOptions,
) -> Result<(), CodecError> {
    list.clear();

    let declared = read_count(&mut reader)?;
    if let Some(limit) = options.max_count {
        if declared > limit {
            return Err(CodecError::CountLimit { declared, limit });
        }
    }
    debug!(declared, "decoding list");

    let mut records: Vec<NodeRecord> = Vec::with_capacity((declared as usize).min(PREALLOC_CAP));
    for index in 0..declared {
        let len = NodeRecord::read_len(&mut reader)?;
        if let Some(limit) = options.max_payload_len {
            if len > limit {
                return Err(CodecError::PayloadLimit { index, declared: len, limit });
            }
        }
        records.push(NodeRecord::read_body(&mut reader, len)?);
    }

    let n = records.len();
    let mut dangling = 0usize;
    let nodes: Vec<Node> = records.into_iter().enumerate().map(|(position, record)| {
        let cross = index::resolve(record.cross, n);
        if cross.is_none() && record.cross != NO_CROSS {
            trace!(position, stored = record.cross, n, "cross index out of range, treated as none");
            dangling += 1;
        }
        Node::new(record.payload, cross)
    }).collect();

    list.replace_nodes(nodes);
    debug!(count = n, dangling, "decoded list");
    Ok(())
}

// ── List convenience ─────────────────────────────────────────────────────────

impl List {
    /// Write the binary form of this list to `writer`.
    pub fn encode<W: Write>(&self, writer: W) -> Result<(), CodecError> {
        encode(self, writer)
    }

    /// Replace this list's content with the list read from `reader`.
    ///
    /// On error the list is left empty and should not be relied on.
    pub fn decode<R: Read>(&mut self, reader: R) -> Result<(), CodecError> {
        decode(self, reader)
    }

    pub fn decode_with<R: Read>(&mut self, reader: R, options: &DecodeOptions) -> Result<(), CodecError> {
        decode_with(self, reader, options)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::new();
        encode(self, &mut out)?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut list = List::new();
        decode(&mut list, Cursor::new(bytes))?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cyclic() -> List {
        let mut list: List = ["Node1", "Node2", "Node3", "Node4", "Node5"].into_iter().collect();
        for (i, j) in [(0, 2), (1, 4), (2, 0), (3, 3), (4, 1)] {
            list.set_cross(i, j);
        }
        list
    }

    /// A sink that accepts at most `room` bytes.
    struct ShortWriter {
        room: usize,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let n = buf.len().min(self.room);
            self.room -= n;
            Ok(n)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn empty_list_is_four_zero_bytes() {
        let bytes = List::new().to_bytes().unwrap();
        assert_eq!(bytes, vec![0, 0, 0, 0]);

        let decoded = List::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.count(), 0);
        assert!(decoded.head().is_none());
        assert!(decoded.tail().is_none());
    }

    #[test]
    fn exact_wire_image() {
        let mut list: List = ["a", ""].into_iter().collect();
        list.set_cross(0, 1);
        let bytes = list.to_bytes().unwrap();
        assert_eq!(bytes, vec![
            2, 0, 0, 0,
            1, 0, 0, 0, b'a', 1, 0, 0, 0,
            0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff,
        ]);
    }

    #[test]
    fn self_reference_round_trips() {
        let mut list = List::new();
        list.append("SingleNode");
        list.set_cross(0, 0);

        let decoded = List::from_bytes(&list.to_bytes().unwrap()).unwrap();
        let head = decoded.head().unwrap();
        assert_eq!(decoded.count(), 1);
        assert_eq!(head.cross(), Some(head));
        assert_eq!(decoded.head(), decoded.tail());
    }

    #[test]
    fn cyclic_cross_references_round_trip() {
        let list = cyclic();
        let decoded = List::from_bytes(&list.to_bytes().unwrap()).unwrap();

        assert_eq!(decoded.count(), 5);
        assert_eq!(decoded.cross_positions(), vec![Some(2), Some(4), Some(0), Some(3), Some(1)]);
        for (before, after) in list.iter().zip(decoded.iter()) {
            assert_eq!(before.payload(), after.payload());
            assert_eq!(before.cross().map(|c| c.payload()), after.cross().map(|c| c.payload()));
        }
        assert_eq!(decoded, list);
    }

    #[test]
    fn decode_replaces_existing_content() {
        let mut target: List = ["old1", "old2", "old3"].into_iter().collect();
        target.set_cross(2, 0);

        let mut source = List::new();
        source.append("new");
        target.decode(Cursor::new(source.to_bytes().unwrap())).unwrap();

        assert_eq!(target.count(), 1);
        assert_eq!(target.head().unwrap().payload(), b"new");
        assert!(target.head().unwrap().cross().is_none());
    }

    #[test]
    fn out_of_range_stored_index_resolves_to_none() {
        let mut bytes = Vec::new();
        write_count(&mut bytes, 3).unwrap();
        NodeRecord::write(b"x", -1, &mut bytes).unwrap();
        NodeRecord::write(b"y", 3, &mut bytes).unwrap();
        NodeRecord::write(b"z", -7, &mut bytes).unwrap();

        let decoded = List::from_bytes(&bytes).unwrap();
        assert_eq!(decoded.count(), 3);
        assert_eq!(decoded.cross_positions(), vec![None, None, None]);
    }

    #[test]
    fn truncated_stream_fails_and_leaves_list_empty() {
        let bytes = cyclic().to_bytes().unwrap();
        for cut in [0, 3, 4, 10, bytes.len() - 1] {
            let mut list: List = ["keep"].into_iter().collect();
            let err = list.decode(Cursor::new(&bytes[..cut])).unwrap_err();
            assert!(err.is_io(), "cut at {cut}: {err}");
            assert!(list.is_empty());
        }
    }

    #[test]
    fn huge_declared_count_fails_on_short_read() {
        let mut bytes = Vec::new();
        write_count(&mut bytes, u32::MAX).unwrap();
        NodeRecord::write(b"only", -1, &mut bytes).unwrap();

        let err = List::from_bytes(&bytes).unwrap_err();
        match err {
            CodecError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn limits_reject_oversized_input() {
        let bytes = cyclic().to_bytes().unwrap();
        let mut list = List::new();

        let opts = DecodeOptions::default().with_max_count(4);
        match list.decode_with(Cursor::new(&bytes), &opts) {
            Err(CodecError::CountLimit { declared: 5, limit: 4 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        let opts = DecodeOptions::default().with_max_payload_len(4);
        match list.decode_with(Cursor::new(&bytes), &opts) {
            Err(CodecError::PayloadLimit { index: 0, declared: 5, limit: 4 }) => {}
            other => panic!("unexpected result: {other:?}"),
        }

        let opts = DecodeOptions::default().with_max_count(5).with_max_payload_len(5);
        list.decode_with(Cursor::new(&bytes), &opts).unwrap();
        assert_eq!(list.count(), 5);
    }

    #[test]
    fn short_write_is_terminal() {
        let list = cyclic();
        let full = list.to_bytes().unwrap().len();
        for room in [0, 2, full - 1] {
            let err = list.encode(ShortWriter { room }).unwrap_err();
            match err {
                CodecError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::WriteZero),
                other => panic!("unexpected error: {other}"),
            }
        }
        list.encode(ShortWriter { room: full }).unwrap();
    }
}
