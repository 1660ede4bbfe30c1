//! On-disk layout.
//!
//! ```text
//! u32 LE   node count
//! repeated `count` times, in traversal order:
//!   u32 LE   payload length
//!   [u8]     payload (absent when length is 0)
//!   i32 LE   cross index (-1 = none)
//! ```
//!
//! No padding, checksum or version tag.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Upper bound on node slots reserved before any record has been read.
pub const PREALLOC_CAP: usize = 4096;

pub fn write_count<W: Write>(mut writer: W, count: u32) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(count)
}

pub fn read_count<R: Read>(mut reader: R) -> io::Result<u32> {
    reader.read_u32::<LittleEndian>()
}

/// One node as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub payload: Vec<u8>,
    pub cross:   i32,
}

impl NodeRecord {
    /// Write a record.  The caller guarantees `payload.len()` fits in `u32`.
    pub fn write<W: Write>(payload: &[u8], cross: i32, mut writer: W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(payload.len() as u32)?;
        if !payload.is_empty() {
            writer.write_all(payload)?;
        }
        writer.write_i32::<LittleEndian>(cross)?;
        Ok(())
    }

    /// Read the length prefix of a record.
    pub fn read_len<R: Read>(mut reader: R) -> io::Result<u32> {
        reader.read_u32::<LittleEndian>()
    }

    /// Read the payload and cross index following a length prefix of `len`.
    ///
    /// The payload is pulled through `Read::take`, so the buffer only grows
    /// as bytes actually arrive; a length larger than the stream fails with
    /// `UnexpectedEof` without allocating the declared size first.
    pub fn read_body<R: Read>(mut reader: R, len: u32) -> io::Result<Self> {
        let mut payload = Vec::with_capacity((len as usize).min(PREALLOC_CAP));
        if len > 0 {
            let got = (&mut reader).take(len as u64).read_to_end(&mut payload)?;
            if got < len as usize {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, format!(
                    "payload truncated: declared {len} bytes, got {got}"
                )));
            }
        }
        let cross = reader.read_i32::<LittleEndian>()?;
        Ok(Self { payload, cross })
    }

    pub fn read<R: Read>(mut reader: R) -> io::Result<Self> {
        let len = Self::read_len(&mut reader)?;
        Self::read_body(reader, len)
    }
}
