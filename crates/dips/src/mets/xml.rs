//! A small owned element tree built from quick-xml events.
//!
//! Namespace prefixes are dropped from element and attribute names while
//! loading, so `mets:file` becomes `file` and `xlink:href` becomes `href`.
//! Namespace declarations themselves are not kept as attributes.
//!
//! Text is kept verbatim, surrounding whitespace included. Text events made
//! only of whitespace are indentation and are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::error::ManifestError;
use super::path::ElementPath;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Text before the first child element, if any.
    pub text: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text content, empty when the element has none.
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// All matches of `path`, in document order.
    pub fn find_all(&self, path: &ElementPath) -> Vec<&Element> {
        path.evaluate(self)
    }

    /// The first match of `path`.
    pub fn find(&self, path: &ElementPath) -> Option<&Element> {
        path.evaluate(self).into_iter().next()
    }

    /// Parses `path` and returns all matches.
    pub fn select(&self, path: &str) -> Result<Vec<&Element>, ManifestError> {
        Ok(self.find_all(&ElementPath::parse(path)?))
    }

    /// Parses `path` and returns the first match.
    pub fn select_one(&self, path: &str) -> Result<Option<&Element>, ManifestError> {
        Ok(self.find(&ElementPath::parse(path)?))
    }

    /// Depth-first iterator over every descendant, excluding `self`.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        let mut stack: Vec<&Element> = self.children.iter().rev().collect();
        while let Some(el) = stack.pop() {
            out.push(el);
            stack.extend(el.children.iter().rev());
        }
        out
    }
}

fn local(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.rfind(':') {
        Some(i) => name[i + 1..].to_string(),
        None => name.into_owned(),
    }
}

fn xml_error(reader: &Reader<&[u8]>, e: impl std::fmt::Display) -> ManifestError {
    ManifestError::Xml {
        position: reader.buffer_position() as u64,
        message: e.to_string(),
    }
}

fn start_element(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Element, ManifestError> {
    let mut element = Element::new(local(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|err| xml_error(reader, err))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| xml_error(reader, err))?
            .into_owned();
        element.attributes.push((local(key), value));
    }
    Ok(element)
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

fn close(stack: &mut Vec<Element>, root: &mut Option<Element>) {
    if let Some(done) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(done),
            None => {
                if root.is_none() {
                    *root = Some(done);
                }
            }
        }
    }
}

/// Parses an XML document into its root element.
pub fn parse(xml: &str) -> Result<Element, ManifestError> {
    let mut reader = Reader::from_str(xml);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let element = start_element(&reader, e)?;
                stack.push(element);
            }
            Ok(Event::Empty(ref e)) => {
                let element = start_element(&reader, e)?;
                stack.push(element);
                close(&mut stack, &mut root);
            }
            Ok(Event::End(_)) => close(&mut stack, &mut root),
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|err| xml_error(&reader, err))?;
                if !text.trim().is_empty() {
                    push_text(&mut stack, &text);
                }
            }
            Ok(Event::CData(e)) => {
                let raw = e.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(xml_error(&reader, e)),
        }
    }

    root.ok_or(ManifestError::NoRoot)
}
