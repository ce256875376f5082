//! XML to WBXML.

use tracing::{debug, trace};

use crate::{
    depth_tracking::DepthTracker,
    document::{Child, Document, Node},
    dtd::Dictionary,
    element::{serialize_elem, Element},
    error::{Error, Result},
    header::Header,
};

/// What the encoder accepts: XML text, or an already-built tree.
///
/// Most callers never name this type and pass a `&str`, `&String`, `&Document` or `&Node`
/// straight to [`Encoder::encode`]. Values that might not hold a document (`Option`s, raw bytes)
/// go through `TryFrom` and fail with [`Error::WrongXmlType`].
#[derive(Clone, Copy, Debug)]
pub enum XmlInput<'a> {
    Text(&'a str),
    Tree(&'a Node),
}

impl<'a> From<&'a str> for XmlInput<'a> {
    fn from(v: &'a str) -> Self {
        XmlInput::Text(v)
    }
}

impl<'a> From<&'a String> for XmlInput<'a> {
    fn from(v: &'a String) -> Self {
        XmlInput::Text(v.as_str())
    }
}

impl<'a> From<&'a Document> for XmlInput<'a> {
    fn from(v: &'a Document) -> Self {
        XmlInput::Tree(&v.root)
    }
}

impl<'a> From<&'a Node> for XmlInput<'a> {
    fn from(v: &'a Node) -> Self {
        XmlInput::Tree(v)
    }
}

impl<'a> TryFrom<Option<&'a str>> for XmlInput<'a> {
    type Error = Error;

    fn try_from(v: Option<&'a str>) -> Result<Self> {
        v.map(XmlInput::Text)
            .ok_or_else(|| Error::WrongXmlType("expected XML text, got nothing".into()))
    }
}

impl<'a> TryFrom<Option<&'a Document>> for XmlInput<'a> {
    type Error = Error;

    fn try_from(v: Option<&'a Document>) -> Result<Self> {
        v.map(XmlInput::from)
            .ok_or_else(|| Error::WrongXmlType("expected an XML document, got nothing".into()))
    }
}

impl<'a> TryFrom<&'a [u8]> for XmlInput<'a> {
    type Error = Error;

    fn try_from(v: &'a [u8]) -> Result<Self> {
        std::str::from_utf8(v)
            .map(XmlInput::Text)
            .map_err(|e| Error::WrongXmlType(format!("XML input is not UTF-8 text: {}", e)))
    }
}

/// Turns XML into WBXML using a [`Dictionary`].
///
/// The encoder holds nothing but the dictionary reference, so one encoder can be shared and used
/// for any number of documents.
///
/// ```
/// # use wbxml_codec::*;
/// let encoder = Encoder::new(Dictionary::activesync());
/// let wbxml = encoder
///     .encode(r#"<FolderSync xmlns="FolderHierarchy:"><SyncKey>0</SyncKey></FolderSync>"#)
///     .unwrap();
/// assert_eq!(wbxml, b"\x03\x01j\x00\x00\x07VR\x030\x00\x01\x01");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Encoder<'d> {
    dict: &'d Dictionary,
}

impl<'d> Encoder<'d> {
    pub fn new(dict: &'d Dictionary) -> Self {
        Self { dict }
    }

    /// Encode a document.
    ///
    /// # Errors
    ///
    /// - `WrongXmlType` if the input can't be turned into XML.
    /// - An XML syntax error if the text doesn't parse into exactly one root element.
    /// - An unknown-tag error for a namespace or tag missing from the dictionary.
    /// - `BadEncode` if some text holds a NUL character.
    /// - `ParseLimit` if elements nest deeper than [`MAX_DEPTH`][crate::MAX_DEPTH].
    pub fn encode<'a, I>(&self, input: I) -> Result<Vec<u8>>
    where
        I: TryInto<XmlInput<'a>>,
        Error: From<I::Error>,
    {
        match input.try_into()? {
            XmlInput::Text(text) => {
                let doc = Document::from_xml(text)?;
                self.encode_tree(&doc.root)
            }
            XmlInput::Tree(root) => self.encode_tree(root),
        }
    }

    fn encode_tree(&self, root: &Node) -> Result<Vec<u8>> {
        let mut state = EncodeState {
            dict: self.dict,
            codepage: 0,
            depth: DepthTracker::new(),
            buf: Vec::new(),
        };
        Header::default().encode_vec(&mut state.buf);
        state.node(root)?;
        debug!(root = %root.name, bytes = state.buf.len(), "encoded WBXML document");
        Ok(state.buf)
    }

    /// Namespace part of a Clark-notation name.
    pub fn get_ns<'a>(&self, qualified: &'a str) -> Option<&'a str> {
        self.dict.get_ns(qualified)
    }

    /// Local part of a Clark-notation name.
    pub fn get_tag<'a>(&self, qualified: &'a str, namespace: Option<&str>) -> &'a str {
        self.dict.get_tag(qualified, namespace)
    }
}

// Everything that changes while walking one document.
struct EncodeState<'d> {
    dict: &'d Dictionary,
    codepage: u8,
    depth: DepthTracker,
    buf: Vec<u8>,
}

impl<'d> EncodeState<'d> {
    fn push(&mut self, elem: Element) -> Result<()> {
        self.depth.update_elem(&elem)?;
        serialize_elem(&mut self.buf, elem);
        Ok(())
    }

    fn node(&mut self, node: &Node) -> Result<()> {
        if let Some(ns) = node.namespace.as_deref() {
            let page = self.dict.codepage_for(ns)?;
            if page != self.codepage {
                trace!(from = self.codepage, to = page, namespace = ns, "switch codepage");
                self.push(Element::SwitchPage(page))?;
                self.codepage = page;
            }
        }
        let code = self.dict.code_for(self.codepage, &node.name)?;
        let content = node.has_content();
        self.push(Element::Tag { code, content })?;
        if !content {
            return Ok(());
        }
        for child in node.children.iter() {
            match child {
                Child::Node(n) => self.node(n)?,
                Child::Text(t) if t.is_empty() => (),
                Child::Text(t) => {
                    if t.contains('\0') {
                        return Err(Error::BadEncode(format!(
                            "text in <{}> contains a NUL character",
                            node.name
                        )));
                    }
                    self.push(Element::Str(t.as_str()))?;
                }
            }
        }
        self.push(Element::End)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dtd::Codepage;

    fn encoder() -> Encoder<'static> {
        Encoder::new(Dictionary::activesync())
    }

    const HEADER: &[u8] = b"\x03\x01j\x00";

    fn body(wbxml: &[u8]) -> &[u8] {
        assert_eq!(&wbxml[..4], HEADER);
        &wbxml[4..]
    }

    #[test]
    fn empty_and_content_elements() {
        let enc = encoder()
            .encode(r#"<Sync xmlns="AirSync:"><GetChanges/><SyncKey>1</SyncKey></Sync>"#)
            .unwrap();
        // Sync|content, GetChanges, SyncKey|content, STR_I "1", END, END
        assert_eq!(body(&enc), b"\x45\x13\x4b\x031\x00\x01\x01");
    }

    #[test]
    fn empty_text_is_no_content() {
        let root = Node::new("Sync", Some("AirSync:".into()))
            .child(Node::new("GetChanges", Some("AirSync:".into())).text(""));
        let enc = encoder().encode(&root).unwrap();
        assert_eq!(body(&enc), b"\x45\x13\x01");
    }

    #[test]
    fn whitespace_text_is_content() {
        let enc = encoder()
            .encode(r#"<Sync xmlns="AirSync:"><SyncKey> </SyncKey></Sync>"#)
            .unwrap();
        // Sync|content, SyncKey|content, STR_I " ", END, END
        assert_eq!(body(&enc), b"\x45\x4b\x03 \x00\x01\x01");
    }

    #[test]
    fn switches_are_not_reverted() {
        let xml = r#"<Sync xmlns="AirSync:" xmlns:A1="Contacts:"><Supported><A1:JobTitle/></Supported><Supported><A1:JobTitle/></Supported><GetChanges/></Sync>"#;
        let enc = encoder().encode(xml).unwrap();
        assert_eq!(
            body(&enc),
            b"\x45\x60\x00\x01\x28\x01\x00\x00\x60\x00\x01\x28\x01\x00\x00\x13\x01"
        );
    }

    #[test]
    fn unqualified_children_use_active_page() {
        let root = Node::new("FolderSync", Some("FolderHierarchy:".into()))
            .child(Node::new("SyncKey", None).text("0"));
        let enc = encoder().encode(&root).unwrap();
        assert_eq!(body(&enc), b"\x00\x07\x56\x52\x030\x00\x01\x01");
    }

    #[test]
    fn input_types() {
        let text = String::from(r#"<Ping xmlns="Ping:"/>"#);
        let doc: Document = text.parse().unwrap();
        let expected = b"\x03\x01j\x00\x00\x0d\x05".to_vec();
        assert_eq!(encoder().encode(text.as_str()).unwrap(), expected);
        assert_eq!(encoder().encode(&text).unwrap(), expected);
        assert_eq!(encoder().encode(&doc).unwrap(), expected);
        assert_eq!(encoder().encode(&doc.root).unwrap(), expected);
        assert_eq!(encoder().encode(Some(text.as_str())).unwrap(), expected);
        assert_eq!(encoder().encode(Some(&doc)).unwrap(), expected);
        assert_eq!(encoder().encode(text.as_bytes()).unwrap(), expected);
    }

    #[test]
    fn wrong_input() {
        let err = encoder().encode(None::<&str>).unwrap_err();
        assert!(matches!(err, Error::WrongXmlType(_)), "{:?}", err);
        let err = encoder().encode(None::<&Document>).unwrap_err();
        assert!(matches!(err, Error::WrongXmlType(_)), "{:?}", err);
        let err = encoder().encode(&b"\xff\xfe<"[..]).unwrap_err();
        assert!(matches!(err, Error::WrongXmlType(_)), "{:?}", err);
        let err = encoder().encode("").unwrap_err();
        assert!(err.is_xml_syntax(), "{:?}", err);
        let err = encoder().encode("<Sync xmlns=\"AirSync:\">").unwrap_err();
        assert!(err.is_xml_syntax(), "{:?}", err);
    }

    #[test]
    fn unknown_names() {
        let err = encoder().encode(r#"<Nope xmlns="AirSync:"/>"#).unwrap_err();
        assert!(
            matches!(err, Error::UnknownTag { codepage: 0, ref tag } if tag == "Nope"),
            "{:?}",
            err
        );
        let err = encoder().encode(r#"<Sync xmlns="Nowhere:"/>"#).unwrap_err();
        assert!(matches!(err, Error::UnknownNamespace(_)), "{:?}", err);
        assert!(err.is_unknown_tag());
    }

    #[test]
    fn nul_in_text() {
        let root = Node::new("Ping", Some("Ping:".into())).leaf("HeartbeatInterval", "4\u{0}80");
        let err = encoder().encode(&root).unwrap_err();
        assert!(matches!(err, Error::BadEncode(_)), "{:?}", err);
    }

    #[test]
    fn depth_limit() {
        let dict = Dictionary::new([Codepage::new(0, "Deep:").tag(0x05, "D")]).unwrap();
        let encoder = Encoder::new(&dict);

        let mut ok = Node::new("D", Some("Deep:".into())).text("x");
        for _ in 1..crate::MAX_DEPTH {
            ok = Node::new("D", Some("Deep:".into())).child(ok);
        }
        encoder.encode(&ok).unwrap();

        let too_deep = Node::new("D", Some("Deep:".into())).child(ok);
        let err = encoder.encode(&too_deep).unwrap_err();
        assert!(matches!(err, Error::ParseLimit(_)), "{:?}", err);
    }

    #[test]
    fn clark_helpers() {
        let enc = encoder();
        assert_eq!(enc.get_ns("{Settings:}Model"), Some("Settings:"));
        assert_eq!(enc.get_tag("{Settings:}Model", Some("Settings:")), "Model");
        assert_eq!(enc.get_tag("Model", None), "Model");
    }
}
