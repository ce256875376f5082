//! WBXML to XML.

use std::collections::HashMap;

use base64::Engine;
use tracing::{debug, trace};

use crate::{
    document::{Child, Document, Node},
    dtd::Dictionary,
    element::{Element, Parser},
    error::{Error, Result},
    header::Header,
};

/// Turns WBXML into an XML [`Document`] using a [`Dictionary`].
///
/// The first codepage seen becomes the default namespace of the result. Every other codepage gets
/// a generated prefix (`A1`, `A2`, ...) in order of first appearance.
///
/// ```
/// # use wbxml_codec::*;
/// let decoder = Decoder::new(Dictionary::activesync());
/// let doc = decoder.decode(b"\x03\x01j\x00\x00\x07VR\x030\x00\x01\x01").unwrap();
/// assert_eq!(
///     doc.to_xml().unwrap(),
///     r#"<FolderSync xmlns="FolderHierarchy:"><SyncKey>0</SyncKey></FolderSync>"#
/// );
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Decoder<'d> {
    dict: &'d Dictionary,
}

impl<'d> Decoder<'d> {
    pub fn new(dict: &'d Dictionary) -> Self {
        Self { dict }
    }

    /// Decode a complete WBXML stream.
    ///
    /// # Errors
    ///
    /// - `BadHeader` if the header is truncated or uses something unsupported.
    /// - `LengthTooShort` if the stream ends inside a token or with elements still open.
    /// - An unknown-tag error for a codepage or code missing from the dictionary.
    /// - `UnsupportedToken` for string table references, literals, extensions, processing
    ///   instructions and attributes.
    /// - `BadEncode` for a stray `END`, a second root element, no root at all, or text that
    ///   isn't UTF-8.
    /// - `ParseLimit` if elements nest deeper than [`MAX_DEPTH`][crate::MAX_DEPTH].
    pub fn decode(&self, wbxml: &[u8]) -> Result<Document> {
        let mut buf = wbxml;
        let header = Header::decode(&mut buf)?;
        let mut state = DecodeState {
            dict: self.dict,
            codepage: 0,
            stack: Vec::new(),
            root: None,
            text: None,
            prefixes: HashMap::new(),
        };
        let mut parser = Parser::new(buf);
        for elem in &mut parser {
            state.element(elem?)?;
        }
        if parser.depth() != 0 {
            return Err(Error::LengthTooShort {
                step: "close open elements",
                actual: 0,
                expected: parser.depth(),
            });
        }
        let root = state
            .root
            .ok_or_else(|| Error::BadEncode("stream holds no root element".into()))?;
        debug!(
            version = header.version,
            bytes = wbxml.len(),
            root = %root.name,
            codepages = state.prefixes.len(),
            "decoded WBXML document"
        );
        Ok(Document {
            declaration: None,
            root,
            text: state.text,
        })
    }
}

// Everything that changes while reading one stream.
struct DecodeState<'d> {
    dict: &'d Dictionary,
    codepage: u8,
    stack: Vec<Node>,
    root: Option<Node>,
    text: Option<String>,
    prefixes: HashMap<u8, Option<String>>,
}

impl<'d> DecodeState<'d> {
    fn element(&mut self, elem: Element) -> Result<()> {
        match elem {
            Element::SwitchPage(page) => {
                trace!(from = self.codepage, to = page, "switch codepage");
                self.codepage = page;
            }
            Element::End => {
                let node = self
                    .stack
                    .pop()
                    .ok_or_else(|| Error::BadEncode("END token with no open element".into()))?;
                self.attach(node)?;
            }
            Element::Str(s) => self.append_text(s),
            Element::Entity(v) => {
                let c = char::from_u32(v).ok_or_else(|| {
                    Error::BadEncode(format!("ENTITY 0x{:x} is not a character", v))
                })?;
                self.append_text(c.encode_utf8(&mut [0u8; 4]));
            }
            Element::Opaque(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) => self.append_text(s),
                Err(_) => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    self.append_text(&encoded)
                }
            },
            Element::Tag { code, content } => {
                let namespace = self.dict.namespace_for(self.codepage)?.to_string();
                let name = self.dict.tag_for(self.codepage, code)?.to_string();
                let mut node = Node::new(name, Some(namespace));
                node.prefix = self.prefix();
                if content {
                    self.stack.push(node);
                } else {
                    self.attach(node)?;
                }
            }
        }
        Ok(())
    }

    // Prefix for the active codepage, allocating one on first use.
    fn prefix(&mut self) -> Option<String> {
        let next = self.prefixes.len();
        let codepage = self.codepage;
        self.prefixes
            .entry(codepage)
            .or_insert_with(|| {
                let prefix = (next > 0).then(|| format!("A{}", next));
                trace!(codepage, prefix = ?prefix, "allocate namespace prefix");
                prefix
            })
            .clone()
    }

    fn attach(&mut self, node: Node) -> Result<()> {
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Child::Node(node)),
            None if self.root.is_none() => self.root = Some(node),
            None => {
                return Err(Error::BadEncode(format!(
                    "second root element <{}>",
                    node.name
                )))
            }
        }
        Ok(())
    }

    // Adjacent text runs are merged, so a document decodes the same however its text was split.
    fn append_text(&mut self, s: &str) {
        match self.stack.last_mut() {
            Some(node) => match node.children.last_mut() {
                Some(Child::Text(t)) => t.push_str(s),
                _ => node.children.push(Child::Text(s.to_string())),
            },
            None => self.text.get_or_insert_with(String::new).push_str(s),
        }
    }
}
