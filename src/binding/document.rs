//! Config document tree
//!
//! A small element tree over `xml-rs` that keeps every name qualified.
//! Element and attribute prefixes, their namespace URIs and the namespace
//! declarations in scope all survive a parse and write cycle.

use std::borrow::Cow;
use std::io::{Read, Write};
use thiserror::Error;
use xml::attribute::{Attribute, OwnedAttribute};
use xml::common::XmlVersion;
use xml::name::OwnedName;
use xml::namespace::{Namespace, NS_NO_PREFIX};
use xml::reader::{self, EventReader, ParserConfig, XmlEvent as ReadEvent};
use xml::writer::{self, EmitterConfig, EventWriter, XmlEvent as WriteEvent};

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Malformed XML: {0}")]
    Malformed(#[from] reader::Error),

    #[error("Document has no root element")]
    NoRoot,

    #[error("Failed to serialize XML: {0}")]
    Emit(#[from] writer::Error),
}

/// A node inside an element or around the root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction { name: String, data: Option<String> },
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its qualified name and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Local name, prefix and resolved namespace URI
    pub name: OwnedName,
    /// Attributes in document order, prefixes included
    pub attributes: Vec<OwnedAttribute>,
    /// Every namespace mapping in scope, inherited ones included
    pub namespaces: Namespace,
    pub children: Vec<Node>,
}

impl Element {
    /// Unprefixed element in the scope of `parent`
    ///
    /// A `namespace` becomes the default namespace of the new element.
    pub fn new_in(parent: &Element, local_name: &str, namespace: Option<&str>) -> Self {
        let mut name = OwnedName::local(local_name);
        let mut namespaces = parent.namespaces.clone();
        if let Some(uri) = namespace {
            name.namespace = Some(uri.to_string());
            namespaces.force_put(NS_NO_PREFIX, uri);
        }
        Self {
            name,
            attributes: Vec::new(),
            namespaces,
            children: Vec::new(),
        }
    }

    pub fn local_name(&self) -> &str {
        &self.name.local_name
    }

    pub fn namespace_uri(&self) -> Option<&str> {
        self.name.namespace_ref()
    }

    /// Value of the unqualified attribute `local_name`
    pub fn attribute(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| is_unqualified(&attr.name, local_name))
            .map(|attr| attr.value.as_str())
    }

    /// Set an unqualified attribute, keeping its position when it already exists
    pub fn set_attribute(&mut self, local_name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|attr| is_unqualified(&attr.name, local_name))
        {
            Some(attr) => attr.value = value,
            None => self
                .attributes
                .push(OwnedAttribute::new(OwnedName::local(local_name), value)),
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element with this local name, in any namespace
    pub fn get_child(&self, local_name: &str) -> Option<&Element> {
        self.child_elements()
            .find(|child| child.local_name() == local_name)
    }
}

fn is_unqualified(name: &OwnedName, local_name: &str) -> bool {
    name.prefix.is_none() && name.namespace.is_none() && name.local_name == local_name
}

/// A parsed config document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub version: XmlVersion,
    pub encoding: String,
    pub standalone: Option<bool>,
    /// Comments and processing instructions before the root element
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root element
    pub epilog: Vec<Node>,
}

impl Document {
    /// Parse a document; insignificant whitespace is dropped
    pub fn parse<R: Read>(source: R) -> Result<Self, DocumentError> {
        let config = ParserConfig::new().ignore_comments(false);
        let mut reader = EventReader::new_with_config(source, config);

        let mut version = XmlVersion::Version10;
        let mut encoding = "utf-8".to_string();
        let mut standalone = None;
        let mut prolog = Vec::new();
        let mut root = None;
        let mut epilog = Vec::new();

        loop {
            match reader.next()? {
                ReadEvent::StartDocument {
                    version: v,
                    encoding: e,
                    standalone: s,
                } => {
                    version = v;
                    encoding = e;
                    standalone = s;
                }
                ReadEvent::StartElement {
                    name,
                    attributes,
                    namespace,
                } => {
                    let element = Element {
                        name,
                        attributes,
                        namespaces: namespace,
                        children: Vec::new(),
                    };
                    root = Some(build(&mut reader, element)?);
                }
                ReadEvent::EndDocument => break,
                event => {
                    let target = if root.is_some() {
                        &mut epilog
                    } else {
                        &mut prolog
                    };
                    target.extend(content_node(event));
                }
            }
        }

        Ok(Self {
            version,
            encoding,
            standalone,
            prolog,
            root: root.ok_or(DocumentError::NoRoot)?,
            epilog,
        })
    }

    /// Write the document with two-space indentation
    pub fn write<W: Write>(&self, sink: W) -> Result<(), DocumentError> {
        let config = EmitterConfig::new().perform_indent(true);
        let mut writer = EventWriter::new_with_config(sink, config);

        writer.write(WriteEvent::StartDocument {
            version: self.version,
            encoding: Some(self.encoding.as_str()),
            standalone: self.standalone,
        })?;
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }
        Ok(())
    }
}

fn build<R: Read>(
    reader: &mut EventReader<R>,
    mut element: Element,
) -> Result<Element, DocumentError> {
    loop {
        match reader.next()? {
            ReadEvent::StartElement {
                name,
                attributes,
                namespace,
            } => {
                let child = Element {
                    name,
                    attributes,
                    namespaces: namespace,
                    children: Vec::new(),
                };
                element.children.push(Node::Element(build(reader, child)?));
            }
            ReadEvent::EndElement { .. } => return Ok(element),
            event => element.children.extend(content_node(event)),
        }
    }
}

/// Node for a content event; markup events and whitespace give `None`
fn content_node(event: ReadEvent) -> Option<Node> {
    match event {
        ReadEvent::Characters(text) => Some(Node::Text(text)),
        ReadEvent::CData(text) => Some(Node::CData(text)),
        ReadEvent::Comment(text) => Some(Node::Comment(text)),
        ReadEvent::ProcessingInstruction { name, data } => {
            Some(Node::ProcessingInstruction { name, data })
        }
        _ => None,
    }
}

fn write_element<W: Write>(
    writer: &mut EventWriter<W>,
    element: &Element,
) -> Result<(), DocumentError> {
    let name = element.name.borrow();
    let attributes: Vec<Attribute<'_>> = element
        .attributes
        .iter()
        .map(OwnedAttribute::borrow)
        .collect();

    writer.write(WriteEvent::StartElement {
        name,
        attributes: Cow::Owned(attributes),
        namespace: Cow::Borrowed(&element.namespaces),
    })?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write(WriteEvent::EndElement { name: Some(name) })?;
    Ok(())
}

fn write_node<W: Write>(writer: &mut EventWriter<W>, node: &Node) -> Result<(), DocumentError> {
    match node {
        Node::Element(element) => return write_element(writer, element),
        Node::Text(text) => writer.write(WriteEvent::Characters(text))?,
        Node::CData(text) => writer.write(WriteEvent::CData(text))?,
        Node::Comment(text) => writer.write(WriteEvent::Comment(text))?,
        Node::ProcessingInstruction { name, data } => {
            writer.write(WriteEvent::ProcessingInstruction {
                name: name.as_str(),
                data: data.as_deref(),
            })?
        }
    }
    Ok(())
}
