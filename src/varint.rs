use byteorder::ReadBytesExt;

use crate::error::{Error, Result};

/// A WBXML `mb_uint32`: big-endian groups of 7 bits, with the high bit set on every byte but the
/// last. At most 5 bytes are needed for a `u32`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VarInt {
    n: [u8; 5],
    len: u8,
}

impl VarInt {
    pub fn from_u32(i: u32) -> VarInt {
        let mut groups = [0u8; 5];
        let mut len = 0usize;
        let mut rest = i;
        loop {
            groups[len] = (rest & 0x7F) as u8;
            len += 1;
            rest >>= 7;
            if rest == 0 {
                break;
            }
        }
        // Groups were collected least-significant first
        let mut n = [0u8; 5];
        for (pos, group) in groups[..len].iter().rev().enumerate() {
            n[pos] = if pos + 1 < len { group | 0x80 } else { *group };
        }
        VarInt { n, len: len as u8 }
    }

    pub fn to_u32(self) -> u32 {
        self.n[..self.len as usize]
            .iter()
            .fold(0u32, |acc, b| (acc << 7) | (b & 0x7F) as u32)
    }

    pub fn write(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.n[..self.len as usize]);
    }

    /// Read an `mb_uint32` off the front of `buf`. `step` names what is being decoded, for error
    /// reporting. Leading zero groups are accepted, and the result is stored in minimal form.
    pub fn read(buf: &mut &[u8], step: &'static str) -> Result<VarInt> {
        let mut value = 0u32;
        loop {
            let byte = buf.read_u8().map_err(|_| Error::LengthTooShort {
                step,
                actual: 0,
                expected: 1,
            })?;
            // Another 7 bits must still fit
            if value > u32::MAX >> 7 {
                return Err(Error::BadEncode(format!("{}: mb_uint32 larger than a u32", step)));
            }
            value = (value << 7) | (byte & 0x7F) as u32;
            if byte & 0x80 == 0 {
                return Ok(VarInt::from_u32(value));
            }
        }
    }
}

impl From<u32> for VarInt {
    fn from(n: u32) -> Self {
        VarInt::from_u32(n)
    }
}

impl From<u8> for VarInt {
    fn from(n: u8) -> Self {
        VarInt::from_u32(n as u32)
    }
}

impl From<VarInt> for u32 {
    fn from(v: VarInt) -> u32 {
        v.to_u32()
    }
}
