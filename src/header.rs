use byteorder::ReadBytesExt;

use crate::{
    error::{Error, Result},
    varint::VarInt,
    CHARSET_UTF8, PUBLIC_ID_UNKNOWN, WBXML_VERSION,
};

/// The fixed header at the front of every WBXML stream.
///
/// Only what ActiveSync needs is supported: UTF-8 text, a numeric public identifier, and an
/// empty string table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub public_id: u32,
    pub charset: u32,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            version: WBXML_VERSION,
            public_id: PUBLIC_ID_UNKNOWN,
            charset: CHARSET_UTF8,
        }
    }
}

impl Header {
    /// Write the header, with a zero-length string table.
    pub fn encode_vec(&self, buf: &mut Vec<u8>) {
        buf.push(self.version);
        VarInt::from(self.public_id).write(buf);
        VarInt::from(self.charset).write(buf);
        VarInt::from(0u32).write(buf);
    }

    /// Read and validate a header off the front of `buf`, leaving `buf` at the first body token.
    pub fn decode(buf: &mut &[u8]) -> Result<Header> {
        let version = buf
            .read_u8()
            .map_err(|_| Error::BadHeader("missing version byte".into()))?;
        if !(0x01..=WBXML_VERSION).contains(&version) {
            return Err(Error::BadHeader(format!(
                "unsupported WBXML version 0x{:02x}",
                version
            )));
        }
        let public_id = read_field(buf, "public identifier")?;
        if public_id == 0 {
            return Err(Error::BadHeader(
                "public identifier refers to the string table".into(),
            ));
        }
        let charset = read_field(buf, "charset")?;
        if charset != CHARSET_UTF8 {
            return Err(Error::BadHeader(format!(
                "unsupported charset {} (only UTF-8 is accepted)",
                charset
            )));
        }
        let str_table_len = read_field(buf, "string table length")?;
        if str_table_len != 0 {
            return Err(Error::BadHeader(format!(
                "string table of {} bytes is not supported",
                str_table_len
            )));
        }
        Ok(Header {
            version,
            public_id,
            charset,
        })
    }
}

fn read_field(buf: &mut &[u8], step: &'static str) -> Result<u32> {
    VarInt::read(buf, step)
        .map(u32::from)
        .map_err(|e| Error::BadHeader(e.to_string()))
}
