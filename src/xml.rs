//! XML text on both sides of the codec: parsing text into a [`Document`] and writing a tree back
//! out.

use std::collections::HashMap;

use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    name::{Namespace, ResolveResult},
    NsReader, Writer,
};

use crate::{
    document::{Child, Declaration, Document, Node},
    error::{Error, Result},
};

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(String::from)
        .map_err(|e| Error::MalformedXml(format!("name is not UTF-8: {}", e)))
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Child::Node(node)),
        None if root.is_none() => *root = Some(node),
        None => {
            return Err(Error::MalformedXml(format!(
                "second root element <{}>",
                node.name
            )))
        }
    }
    Ok(())
}

// Adjacent runs (split by comments or CDATA) become one text child.
fn push_text(node: &mut Node, text: &str) {
    match node.children.last_mut() {
        Some(Child::Text(last)) => last.push_str(text),
        _ => node.children.push(Child::Text(text.to_string())),
    }
}

// Whitespace-only runs next to child elements are formatting. In a leaf they are content.
fn drop_formatting(node: &mut Node) {
    if node.nodes().next().is_some() {
        node.children.retain(|child| match child {
            Child::Text(t) => !t.trim().is_empty(),
            Child::Node(_) => true,
        });
    }
}

fn start_node(ns: ResolveResult, start: &BytesStart) -> Result<Node> {
    for attr in start.attributes() {
        let attr = attr?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        return Err(Error::WrongXmlType(format!(
            "attribute {} on <{}>: this profile has no attributes",
            String::from_utf8_lossy(key),
            String::from_utf8_lossy(start.name().as_ref())
        )));
    }
    let namespace = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(utf8(uri)?),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(Error::MalformedXml(format!(
                "unbound namespace prefix {}",
                String::from_utf8_lossy(&prefix)
            )))
        }
    };
    let name = start.name();
    let mut node = Node::new(utf8(name.local_name().as_ref())?, namespace);
    if let Some(prefix) = name.prefix() {
        node.prefix = Some(utf8(prefix.as_ref())?);
    }
    Ok(node)
}

fn parse_decl(decl: &BytesDecl) -> Result<Declaration> {
    let version = utf8(&decl.version()?)?;
    let encoding = match decl.encoding() {
        Some(enc) => Some(utf8(&enc.map_err(Error::from)?)?),
        None => None,
    };
    let standalone = match decl.standalone() {
        Some(sa) => Some(utf8(&sa.map_err(Error::from)?)?),
        None => None,
    };
    Ok(Declaration {
        version,
        encoding,
        standalone,
    })
}

/// Parse XML text into a document. Whitespace-only text is dropped from elements that have child
/// elements, and kept in elements that don't.
pub(crate) fn parse(text: &str) -> Result<Document> {
    let mut reader = NsReader::from_str(text);
    let mut stack: Vec<Node> = Vec::new();
    let mut root: Option<Node> = None;
    let mut declaration = None;

    loop {
        let (ns, event) = reader.read_resolved_event()?;
        match event {
            Event::Decl(decl) => declaration = Some(parse_decl(&decl)?),
            Event::Start(start) => stack.push(start_node(ns, &start)?),
            Event::Empty(start) => {
                let node = start_node(ns, &start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(end) => {
                let mut node = stack.pop().ok_or_else(|| {
                    Error::MalformedXml(format!(
                        "closing tag </{}> with no open element",
                        String::from_utf8_lossy(end.name().as_ref())
                    ))
                })?;
                drop_formatting(&mut node);
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(t) => {
                let t = t.unescape()?;
                match stack.last_mut() {
                    Some(node) => push_text(node, &t),
                    None if t.trim().is_empty() => (),
                    None => {
                        return Err(Error::MalformedXml(
                            "text outside of the root element".into(),
                        ))
                    }
                }
            }
            Event::CData(c) => {
                let t = std::str::from_utf8(&c)
                    .map_err(|e| Error::MalformedXml(format!("CDATA is not UTF-8: {}", e)))?;
                match stack.last_mut() {
                    Some(node) => push_text(node, t),
                    None => {
                        return Err(Error::MalformedXml(
                            "CDATA outside of the root element".into(),
                        ))
                    }
                }
            }
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => (),
            Event::Eof => break,
        }
    }

    if let Some(open) = stack.last() {
        return Err(Error::MalformedXml(format!(
            "element <{}> is never closed",
            open.name
        )));
    }
    let root = root.ok_or_else(|| Error::MalformedXml("no root element found".into()))?;
    Ok(Document {
        declaration,
        root,
        text: None,
    })
}

fn write_err(e: impl std::fmt::Display) -> Error {
    Error::BadEncode(format!("writing XML: {}", e))
}

/// Namespace bindings in scope while writing.
#[derive(Clone, Default)]
struct Scope<'a> {
    default: Option<&'a str>,
    prefixes: HashMap<&'a str, &'a str>,
}

// Collect the first binding of every prefix in the tree, in document order.
fn collect_prefixes<'a>(node: &'a Node, found: &mut Vec<(&'a str, &'a str)>) {
    if let (Some(prefix), Some(ns)) = (node.prefix.as_deref(), node.namespace.as_deref()) {
        if !found.iter().any(|(p, _)| *p == prefix) {
            found.push((prefix, ns));
        }
    }
    for child in node.nodes() {
        collect_prefixes(child, found);
    }
}

fn write_node<'a>(
    writer: &mut Writer<Vec<u8>>,
    node: &'a Node,
    scope: &Scope<'a>,
    root_bindings: &[(&'a str, &'a str)],
) -> Result<()> {
    let mut inner = scope.clone();
    let mut attrs: Vec<(String, &str)> = Vec::new();

    let qname = match (node.prefix.as_deref(), node.namespace.as_deref()) {
        (Some(prefix), Some(ns)) => {
            if inner.prefixes.get(prefix) != Some(&ns) {
                attrs.push((format!("xmlns:{}", prefix), ns));
                inner.prefixes.insert(prefix, ns);
            }
            format!("{}:{}", prefix, node.name)
        }
        (_, ns) => {
            if inner.default != ns {
                attrs.push(("xmlns".to_string(), ns.unwrap_or("")));
                inner.default = ns;
            }
            node.name.clone()
        }
    };
    for &(prefix, ns) in root_bindings {
        if inner.prefixes.get(prefix) != Some(&ns) {
            attrs.push((format!("xmlns:{}", prefix), ns));
            inner.prefixes.insert(prefix, ns);
        }
    }

    let mut start = BytesStart::new(qname.as_str());
    for (key, value) in attrs.iter() {
        start.push_attribute((key.as_str(), *value));
    }

    if node.children.is_empty() {
        writer.write_event(Event::Empty(start)).map_err(write_err)?;
        return Ok(());
    }
    writer.write_event(Event::Start(start)).map_err(write_err)?;
    for child in node.children.iter() {
        match child {
            Child::Node(n) => write_node(writer, n, &inner, &[])?,
            Child::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(write_err)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(qname.as_str())))
        .map_err(write_err)?;
    Ok(())
}

/// Write a tree as XML text. Every prefix used in the tree is declared on the root element.
pub(crate) fn write(declaration: Option<&Declaration>, root: &Node) -> Result<String> {
    let mut writer = Writer::new(Vec::new());
    if let Some(decl) = declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))
            .map_err(write_err)?;
    }
    let mut bindings = Vec::new();
    collect_prefixes(root, &mut bindings);
    write_node(&mut writer, root, &Scope::default(), &bindings)?;
    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::BadEncode(format!("XML output is not UTF-8: {}", e)))
}
