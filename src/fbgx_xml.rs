// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Form Builder XML Layer
/// Small owned element tree between the form model and quick_xml
///
/// The model serializes into `XmlElement` values and reads from them; this
/// module is the only place that talks to the quick_xml reader and writer.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::fbgt_types::FormError;

// ============================================================================
// SECTION 1: Element tree
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        XmlElement {
            name: name.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag comparison used by import dispatch
    pub fn is(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set an attribute, overwriting in place so attribute order stays stable
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == name) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((name.to_string(), value.to_string()));
        }
    }

    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: &str) {
        self.children.push(XmlNode::Text(text.to_string()));
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        self.children.iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<(), FormError> {
        let mut start = BytesStart::new(self.name.as_str());
        for (k, v) in &self.attributes {
            start.push_attribute((k.as_str(), v.as_str()));
        }

        if self.children.is_empty() {
            return write(writer, Event::Empty(start));
        }

        write(writer, Event::Start(start))?;
        for child in &self.children {
            match child {
                XmlNode::Element(e) => e.write_into(writer)?,
                XmlNode::Text(t) => write(writer, Event::Text(BytesText::new(t)))?,
            }
        }
        write(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), FormError> {
    writer.write_event(event).map_err(|e| FormError::Xml(e.to_string()))
}

// ============================================================================
// SECTION 2: Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        XmlDocument { root }
    }

    /// Serialize with an XML declaration and two-space indentation
    pub fn to_xml_string(&self) -> Result<String, FormError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.root.write_into(&mut writer)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| FormError::Xml(format!("writer produced invalid UTF-8: {}", e)))
    }

    pub fn parse(xml: &str) -> Result<Self, FormError> {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();

        // Open elements, innermost last
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            buf.clear();
            let event = reader.read_event_into(&mut buf)
                .map_err(|e| FormError::Xml(format!("parse error at byte {}: {}", reader.buffer_position(), e)))?;

            match event {
                Event::Start(ref e) => {
                    stack.push(element_from_start(e)?);
                }
                Event::Empty(ref e) => {
                    let element = element_from_start(e)?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack.pop()
                        .ok_or_else(|| FormError::Xml("unbalanced end tag".to_string()))?;
                    close_element(element, &mut stack, &mut root)?;
                }
                Event::Text(ref t) => {
                    if let Some(open) = stack.last_mut() {
                        let text = t.unescape()
                            .map_err(|e| FormError::Xml(format!("bad text at byte {}: {}", reader.buffer_position(), e)))?;
                        open.push_text(&text);
                    }
                }
                Event::CData(c) => {
                    if let Some(open) = stack.last_mut() {
                        open.push_text(&String::from_utf8_lossy(&c.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(FormError::Xml(format!("unexpected EOF inside <{}>", stack[stack.len() - 1].name)));
        }

        root.map(XmlDocument::new)
            .ok_or_else(|| FormError::Xml("document has no root element".to_string()))
    }
}

fn element_from_start(e: &BytesStart<'_>) -> Result<XmlElement, FormError> {
    let mut element = XmlElement::new(&String::from_utf8_lossy(e.name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|e| FormError::Xml(format!("attribute error: {}", e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = attr.unescape_value()
            .map_err(|e| FormError::Xml(format!("attribute '{}': {}", key, e)))?;
        element.set_attr(&key, &value);
    }
    Ok(element)
}

fn close_element(
    element: XmlElement,
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
) -> Result<(), FormError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
        Ok(())
    } else if root.is_some() {
        Err(FormError::Xml(format!("second root element <{}>", element.name)))
    } else {
        *root = Some(element);
        Ok(())
    }
}
