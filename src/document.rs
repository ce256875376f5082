use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::{
    dtd::{get_ns, get_tag},
    error::Result,
    xml,
};

/// The XML declaration (`<?xml version="1.0" encoding="utf-8"?>`). WBXML doesn't carry it, so
/// decoded documents never have one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".into(),
            encoding: Some("utf-8".into()),
            standalone: None,
        }
    }
}

/// A child of an element: either another element or a run of text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Child {
    Node(Node),
    Text(String),
}

/// An XML element.
///
/// Equality compares the local name, namespace and children. The prefix only matters when the
/// node is written out as text, and is ignored.
#[derive(Educe, Clone, Debug, Serialize, Deserialize)]
#[educe(PartialEq)]
pub struct Node {
    /// Local name, e.g. `"SyncKey"`.
    pub name: String,
    /// Namespace URI, e.g. `"AirSync:"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Prefix to use when rendering; `None` means the default namespace.
    #[educe(PartialEq(ignore))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

impl Node {
    /// Create an empty element in a namespace.
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            prefix: None,
            children: Vec::new(),
        }
    }

    /// Create an empty element from a Clark-notation name: `{AirSync:}Sync`, or a bare local
    /// name for no namespace.
    pub fn from_clark(qualified: &str) -> Self {
        let namespace = get_ns(qualified);
        let name = get_tag(qualified, namespace);
        Self::new(name, namespace.map(String::from))
    }

    /// The Clark-notation name of this element.
    pub fn clark_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    /// Set the rendering prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Append a child element.
    pub fn child(mut self, node: Node) -> Self {
        self.children.push(Child::Node(node));
        self
    }

    /// Append a text run.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    /// Append a child element holding only text. The child takes this element's namespace and
    /// prefix.
    pub fn leaf(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut leaf = Node::new(name, self.namespace.clone()).text(text);
        leaf.prefix = self.prefix.clone();
        self.child(leaf)
    }

    /// Concatenation of the direct text children.
    pub fn text_content(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                Child::Text(t) => Some(t.as_str()),
                Child::Node(_) => None,
            })
            .collect()
    }

    /// Iterate over the child elements, skipping text.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|c| match c {
            Child::Node(n) => Some(n),
            Child::Text(_) => None,
        })
    }

    /// First child element with the given local name.
    pub fn find(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|n| n.name == name)
    }

    /// True if the element has a child element or any non-empty text. Such elements are encoded
    /// with the content bit and a closing `END`.
    pub fn has_content(&self) -> bool {
        self.children.iter().any(|c| match c {
            Child::Node(_) => true,
            Child::Text(t) => !t.is_empty(),
        })
    }

    /// Render this element, and its children, as XML text.
    pub fn to_xml(&self) -> Result<String> {
        xml::write(None, self)
    }
}

/// A complete XML document: an optional declaration and a root element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declaration: Option<Declaration>,
    pub root: Node,
    /// Text found at document level, outside the root element. Only the decoder produces it.
    ///
    /// It has no place in well-formed XML, so [`to_xml`][Document::to_xml] leaves it out, and
    /// encoding a document writes only the root element. A stream carrying such text does not
    /// re-encode to the same bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Document {
    pub fn new(root: Node) -> Self {
        Self {
            declaration: None,
            root,
            text: None,
        }
    }

    /// Parse XML text.
    ///
    /// # Errors
    ///
    /// Fails with the XML parser's error on malformed text, with `MalformedXml` if the text
    /// doesn't hold exactly one root element, and with `WrongXmlType` if an element carries
    /// attributes other than namespace declarations.
    pub fn from_xml(text: &str) -> Result<Self> {
        xml::parse(text)
    }

    /// Render the document as XML text.
    pub fn to_xml(&self) -> Result<String> {
        xml::write(self.declaration.as_ref(), &self.root)
    }
}

impl std::str::FromStr for Document {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_xml(s)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clark_names() {
        let node = Node::from_clark("{FolderHierarchy:}FolderSync");
        assert_eq!(node.name, "FolderSync");
        assert_eq!(node.namespace.as_deref(), Some("FolderHierarchy:"));
        assert_eq!(node.clark_name(), "{FolderHierarchy:}FolderSync");

        let bare = Node::from_clark("FolderSync");
        assert_eq!(bare.namespace, None);
        assert_eq!(bare.clark_name(), "FolderSync");
    }

    #[test]
    fn equality_ignores_prefix() {
        let a = Node::new("JobTitle", Some("Contacts:".to_string())).with_prefix("A1");
        let b = Node::new("JobTitle", Some("Contacts:".to_string())).with_prefix("ns0");
        assert_eq!(a, b);
        let c = Node::new("JobTitle", Some("Contacts2:".to_string())).with_prefix("A1");
        assert_ne!(a, c);
    }

    #[test]
    fn content() {
        let ns = Some("AirSync:".to_string());
        assert!(!Node::new("GetChanges", ns.clone()).has_content());
        assert!(!Node::new("GetChanges", ns.clone()).text("").has_content());
        assert!(Node::new("SyncKey", ns.clone()).text("0").has_content());
        let parent = Node::new("Collection", ns.clone())
            .leaf("SyncKey", "0")
            .child(Node::new("GetChanges", ns));
        assert!(parent.has_content());
        assert_eq!(parent.nodes().count(), 2);
        assert_eq!(parent.find("SyncKey").unwrap().text_content(), "0");
        assert_eq!(
            parent.find("SyncKey").unwrap().namespace.as_deref(),
            Some("AirSync:")
        );
        assert!(parent.find("Class").is_none());
    }

    #[test]
    fn serde_shape() {
        let node = Node::new("SyncKey", Some("AirSync:".to_string())).text("0");
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(
            json,
            r#"{"name":"SyncKey","namespace":"AirSync:","children":[{"Text":"0"}]}"#
        );
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
