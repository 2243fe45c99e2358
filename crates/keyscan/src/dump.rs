//! # Packet dump format
//!
//! A flat capture of RTP packets, each record prefixed by its length:
//!
//! ```text
//! +----------------+------------------------+
//! | length (u16 BE)| packet (length bytes)  |
//! +----------------+------------------------+
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::DumpError;

/// Append one packet record.
pub fn write_record(buf: &mut BytesMut, packet: &[u8]) -> Result<(), DumpError> {
    let len = u16::try_from(packet.len()).map_err(|_| DumpError::Oversized(packet.len()))?;
    buf.reserve(2 + packet.len());
    buf.put_u16(len);
    buf.put_slice(packet);
    Ok(())
}

/// Iterator over the records of a dump. Stops after the first error.
#[derive(Debug, Clone)]
pub struct Records {
    data: Bytes,
    index: usize,
    failed: bool,
}

impl Records {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            index: 0,
            failed: false,
        }
    }
}

impl Iterator for Records {
    type Item = Result<Bytes, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.data.has_remaining() {
            return None;
        }

        let index = self.index;
        self.index += 1;

        if self.data.remaining() < 2 {
            self.failed = true;
            return Some(Err(DumpError::TruncatedRecord {
                index,
                needed: 2,
                available: self.data.remaining(),
            }));
        }

        let len = self.data.get_u16() as usize;
        if self.data.remaining() < len {
            self.failed = true;
            return Some(Err(DumpError::TruncatedRecord {
                index,
                needed: len,
                available: self.data.remaining(),
            }));
        }

        Some(Ok(self.data.split_to(len)))
    }
}
