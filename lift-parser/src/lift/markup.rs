//! Markup adapter
//!
//!     Thin layer over quick-xml. Parsing turns bytes into an owned, navigable element tree;
//!     serialization turns the tree back into indented UTF-8 text. The schema engine in
//!     `mapping` and `serializing` is the only consumer.
//!
//! Whitespace
//!
//!     An element keeps its whitespace when it is a character-data element (`text`, `span`)
//!     or already holds non-whitespace text, and so does everything inside it. Elsewhere
//!     whitespace-only text nodes are indentation and are dropped while parsing.
//!
//!     The writer follows the same rule from the other side: it indents element-only content
//!     and writes whitespace-keeping elements verbatim, so no indentation ever lands where
//!     the reader would keep it.

use super::error::{LiftError, LiftResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;

/// Elements whose content is character data, whitespace included.
const VERBATIM: &[&str] = &["text", "span"];

const INDENT: &str = "  ";

/// A markup element with its attributes (in document order) and mixed children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.push_text(text);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(index).1)
    }

    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Append text, merging with a preceding text node.
    pub fn push_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        match self.children.last_mut() {
            Some(Node::Text(existing)) => existing.push_str(&text),
            _ => self.children.push(Node::Text(text)),
        }
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |element| element.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|element| element.name == name)
    }

    /// Concatenation of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Whether whitespace-only text in this element is content rather than layout.
    pub fn keeps_whitespace(&self) -> bool {
        VERBATIM.contains(&self.name.as_str())
            || self.children.iter().any(|node| match node {
                Node::Text(text) => !text.trim().is_empty(),
                Node::Element(_) => false,
            })
    }

    /// First descendant (depth-first, document order) with the given name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        for element in self.elements() {
            if element.name == name {
                return Some(element);
            }
            if let Some(found) = element.find(name) {
                return Some(found);
            }
        }
        None
    }
}

fn malformed(message: impl Into<String>, position: u64) -> LiftError {
    LiftError::MalformedDocument {
        message: message.into(),
        position,
    }
}

fn decode_name(raw: &[u8], position: u64) -> LiftResult<String> {
    std::str::from_utf8(raw)
        .map(str::to_string)
        .map_err(|e| malformed(format!("invalid UTF-8 in name: {e}"), position))
}

fn open_element(start: &BytesStart<'_>, position: u64) -> LiftResult<Element> {
    let mut element = Element::new(decode_name(start.name().as_ref(), position)?);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| malformed(e.to_string(), position))?;
        let key = decode_name(attribute.key.as_ref(), position)?;
        let value = attribute
            .unescape_value()
            .map_err(|e| malformed(e.to_string(), position))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
    position: u64,
) -> LiftResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.push_element(element),
        None if root.is_some() => {
            return Err(malformed(
                format!("second root element <{}>", element.name),
                position,
            ))
        }
        None => *root = Some(element),
    }
    Ok(())
}

fn attach_text(stack: &mut [Element], text: Cow<'_, str>, position: u64) -> LiftResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_text(text.into_owned());
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(malformed("text outside of the root element", position)),
    }
}

fn strip_layout(element: &mut Element, verbatim: bool) {
    let verbatim = verbatim || element.keeps_whitespace();
    if !verbatim {
        element.children.retain(|node| match node {
            Node::Text(text) => !text.trim().is_empty(),
            Node::Element(_) => true,
        });
    }
    for node in &mut element.children {
        if let Node::Element(child) = node {
            strip_layout(child, verbatim);
        }
    }
}

/// Parse bytes into an element tree.
///
/// Fails with [`LiftError::MalformedDocument`] on anything that is not a single well-formed
/// element: unclosed or mismatched tags, a second root, stray text, bad escapes.
pub fn parse(bytes: &[u8]) -> LiftResult<Element> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| malformed(e.to_string(), position))?;
        match event {
            Event::Start(start) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("content after the root element", position));
                }
                stack.push(open_element(&start, position)?);
            }
            Event::Empty(start) => {
                let element = open_element(&start, position)?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::End(end) => {
                let element = stack.pop().ok_or_else(|| {
                    malformed(
                        format!(
                            "closing tag </{}> without an open element",
                            String::from_utf8_lossy(end.name().as_ref())
                        ),
                        position,
                    )
                })?;
                attach(&mut stack, &mut root, element, position)?;
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|e| malformed(e.to_string(), position))?;
                attach_text(&mut stack, text, position)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8(data.into_inner().into_owned())
                    .map_err(|e| malformed(e.to_string(), position))?;
                attach_text(&mut stack, Cow::Owned(text), position)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no data.
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(malformed(
            format!("unclosed element <{}>", open.name),
            reader.buffer_position() as u64,
        ));
    }
    let mut root = root.ok_or_else(|| malformed("document has no root element", 0))?;
    strip_layout(&mut root, false);
    Ok(root)
}

pub fn parse_str(source: &str) -> LiftResult<Element> {
    parse(source.as_bytes())
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> LiftResult<()> {
    writer
        .write_event(event)
        .map_err(|e| LiftError::Serialize(e.to_string()))
}

fn write_indent<W: std::io::Write>(writer: &mut Writer<W>, depth: usize) -> LiftResult<()> {
    let layout = format!("\n{}", INDENT.repeat(depth));
    write_event(writer, Event::Text(BytesText::new(&layout)))
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &Element,
    depth: usize,
    verbatim: bool,
) -> LiftResult<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if element.children.is_empty() {
        return write_event(writer, Event::Empty(start));
    }
    write_event(writer, Event::Start(start))?;
    let verbatim = verbatim || element.keeps_whitespace();
    let mut indented = false;
    for child in &element.children {
        match child {
            Node::Element(child) => {
                if !verbatim {
                    write_indent(writer, depth + 1)?;
                    indented = true;
                }
                write_element(writer, child, depth + 1, verbatim)?;
            }
            // Outside verbatim content only whitespace remains here, and it is layout.
            Node::Text(text) if verbatim => {
                write_event(writer, Event::Text(BytesText::new(text)))?
            }
            Node::Text(_) => {}
        }
    }
    if indented {
        write_indent(writer, depth)?;
    }
    write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
}

/// Serialize a tree to indented UTF-8 text with an XML declaration.
pub fn serialize(root: &Element) -> LiftResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_event(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    write_indent(&mut writer, 0)?;
    write_element(&mut writer, root, 0, false)?;
    let mut output =
        String::from_utf8(writer.into_inner()).map_err(|e| LiftError::Serialize(e.to_string()))?;
    output.push('\n');
    Ok(output)
}
