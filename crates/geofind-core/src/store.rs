//! Length-prefixed record stores with positional random access.
//!
//! Two blob kinds share the same discipline:
//!
//! - the **cities blob** is a concatenation of `(unsigned-varint length,
//!   payload)` frames, one bincode-encoded [`City`] per frame;
//! - the **points blob** is a concatenation of fixed 24-byte frames, one
//!   encoded unit vector per frame.
//!
//! Writers are append-only and hand back `(offset, length)` pairs which the
//! caller accumulates into the meta's parallel vectors. Readers never touch
//! a shared file cursor: every read is positional (`pread`-style), so
//! concurrent queries do not contend on seek state.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::city::City;
use crate::error::{GeoFindError, Result};
use crate::geom::Point;

/// Encoded size of one point frame: three little-endian `f64`s.
pub const POINT_FRAME_LEN: usize = 24;

fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.read_exact_at(buf, offset)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        let mut pos = 0;
        while pos < buf.len() {
            let n = file.seek_read(&mut buf[pos..], offset + pos as u64)?;
            if n == 0 {
                return Err(std::io::ErrorKind::UnexpectedEof.into());
            }
            pos += n;
        }
        Ok(())
    }
}

fn put_uvarint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Decodes an unsigned varint; returns the value and the number of bytes
/// consumed, or `None` on truncated or over-long input.
fn get_uvarint(buf: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in buf.iter().enumerate() {
        if shift >= 64 {
            return None;
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

/// Append-only writer for the cities blob.
pub struct CityStoreWriter {
    out: BufWriter<File>,
    offset: i64,
    frame: Vec<u8>,
}

impl CityStoreWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
            offset: 0,
            frame: Vec::new(),
        })
    }

    /// Streams one record, returning its `(offset, length)` in the blob.
    pub fn append(&mut self, city: &City) -> Result<(i64, i64)> {
        let payload = bincode::serialize(city).map_err(GeoFindError::Encode)?;
        self.frame.clear();
        put_uvarint(&mut self.frame, payload.len() as u64);
        self.frame.extend_from_slice(&payload);

        let offset = self.offset;
        self.out.write_all(&self.frame)?;
        self.offset += self.frame.len() as i64;
        Ok((offset, self.frame.len() as i64))
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Read-only view over the cities blob, addressed by [`CityId`]-style dense
/// indexes through the meta's offset/length vectors.
pub struct CityStore {
    file: File,
    offsets: Vec<i64>,
    lengths: Vec<i64>,
}

impl CityStore {
    pub fn open(path: &Path, offsets: Vec<i64>, lengths: Vec<i64>) -> Result<Self> {
        debug_assert_eq!(offsets.len(), lengths.len());
        Ok(Self {
            file: File::open(path)?,
            offsets,
            lengths,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Reads and decodes the record at index `i` with one bounded
    /// positional read.
    pub fn read_at(&self, i: usize) -> Result<City> {
        if i >= self.offsets.len() {
            return Err(GeoFindError::IndexOutOfRange {
                index: i,
                len: self.offsets.len(),
            });
        }
        let offset = self.offsets[i];
        let length = self.lengths[i];
        if offset < 0 || length <= 0 {
            return Err(GeoFindError::CorruptRecord {
                offset,
                reason: format!("invalid frame bounds (length {length})"),
            });
        }

        let mut buf = vec![0u8; length as usize];
        read_exact_at(&self.file, &mut buf, offset as u64).map_err(|e| {
            GeoFindError::CorruptRecord {
                offset,
                reason: format!("short read: {e}"),
            }
        })?;

        let (payload_len, prefix_len) =
            get_uvarint(&buf).ok_or_else(|| GeoFindError::CorruptRecord {
                offset,
                reason: "bad length prefix".into(),
            })?;
        if prefix_len as u64 + payload_len != length as u64 {
            return Err(GeoFindError::CorruptRecord {
                offset,
                reason: format!(
                    "length prefix {payload_len} disagrees with frame length {length}"
                ),
            });
        }

        bincode::deserialize(&buf[prefix_len..]).map_err(|e| GeoFindError::CorruptRecord {
            offset,
            reason: format!("payload decode: {e}"),
        })
    }
}

/// Append-only writer for the points blob.
pub struct PointStoreWriter {
    out: BufWriter<File>,
    offset: i64,
}

impl PointStoreWriter {
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
            offset: 0,
        })
    }

    /// Writes one point frame, returning its offset in the blob.
    pub fn append(&mut self, point: &Point) -> Result<i64> {
        let frame = bincode::serialize(point).map_err(GeoFindError::Encode)?;
        debug_assert_eq!(frame.len(), POINT_FRAME_LEN);
        let offset = self.offset;
        self.out.write_all(&frame)?;
        self.offset += frame.len() as i64;
        Ok(offset)
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Read-only view over the points blob.
pub struct PointStore {
    file: File,
    offsets: Vec<i64>,
}

impl PointStore {
    pub fn open(path: &Path, offsets: Vec<i64>) -> Result<Self> {
        Ok(Self {
            file: File::open(path)?,
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Seeks to `point_offsets[i]` and decodes exactly one point.
    pub fn read_at(&self, i: usize) -> Result<Point> {
        if i >= self.offsets.len() {
            return Err(GeoFindError::IndexOutOfRange {
                index: i,
                len: self.offsets.len(),
            });
        }
        let offset = self.offsets[i];
        let mut buf = [0u8; POINT_FRAME_LEN];
        read_exact_at(&self.file, &mut buf, offset as u64).map_err(|e| {
            GeoFindError::CorruptRecord {
                offset,
                reason: format!("short read: {e}"),
            }
        })?;
        bincode::deserialize(&buf).map_err(|e| GeoFindError::CorruptRecord {
            offset,
            reason: format!("point decode: {e}"),
        })
    }
}
