//! wbxml-codec converts XML documents to and from WAP Binary XML (WBXML), the compact binary form
//! of XML that Exchange ActiveSync speaks over HTTP.
//!
//! WBXML replaces every element name with a one-byte code looked up in a per-namespace table,
//! called a codepage. A document moves between namespaces with `SWITCH_PAGE` tokens, element
//! content is closed with `END`, and text is carried inline as NUL-terminated UTF-8. This crate
//! supports the subset ActiveSync uses:
//!
//! - A fixed header: version 1.3, unknown public identifier, UTF-8, and an empty string table.
//! - Elements with and without content, across any number of codepages.
//! - Inline strings. On decode, `ENTITY` and `OPAQUE` data is accepted as text as well.
//! - No attributes, no string table references, no extension tokens.
//!
//! The [`Dictionary`] holds the code tables. [`Dictionary::activesync`] is the built-in table for
//! the ActiveSync protocol, and custom dictionaries can be built from [`Codepage`] values.
//!
//! ```
//! # use wbxml_codec::*;
//! # fn main() -> Result<(), Error> {
//! let xml = r#"<FolderSync xmlns="FolderHierarchy:"><SyncKey>0</SyncKey></FolderSync>"#;
//! let wbxml = encode(xml)?;
//! assert_eq!(wbxml, b"\x03\x01j\x00\x00\x07VR\x030\x00\x01\x01");
//!
//! let doc = decode(&wbxml)?;
//! assert_eq!(doc.root.find("SyncKey").unwrap().text_content(), "0");
//! assert_eq!(doc.to_xml()?, xml);
//! # Ok(())
//! # }
//! ```
//!
//! Encoder, decoder and dictionary hold no mutable state, so they can be shared freely between
//! threads.

mod codepages;
mod decode;
mod depth_tracking;
mod document;
mod dtd;
mod element;
mod encode;
mod error;
mod header;
mod token;
mod varint;
mod xml;

pub use self::decode::Decoder;
pub use self::document::{Child, Declaration, Document, Node};
pub use self::dtd::{get_ns, get_tag, Codepage, Dictionary};
pub use self::encode::{Encoder, XmlInput};
pub use self::error::{Error, Result};
pub use self::header::Header;

/// The WBXML version written by the encoder: 1.3.
pub const WBXML_VERSION: u8 = 0x03;
/// Public identifier for "unknown or missing public identifier", the one ActiveSync sends.
pub const PUBLIC_ID_UNKNOWN: u32 = 0x01;
/// IANA MIBenum for UTF-8, the only charset supported.
pub const CHARSET_UTF8: u32 = 106;
/// The maximum nesting depth of elements with content, in either direction.
pub const MAX_DEPTH: usize = 100;

/// Encode XML with the built-in ActiveSync dictionary. See [`Encoder::encode`].
pub fn encode<'a, I>(input: I) -> Result<Vec<u8>>
where
    I: TryInto<XmlInput<'a>>,
    Error: From<I::Error>,
{
    Encoder::new(Dictionary::activesync()).encode(input)
}

/// Decode WBXML with the built-in ActiveSync dictionary. See [`Decoder::decode`].
pub fn decode(wbxml: &[u8]) -> Result<Document> {
    Decoder::new(Dictionary::activesync()).decode(wbxml)
}
