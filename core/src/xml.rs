//! Owned element tree built from the service's XML replies.
//!
//! # Design
//! Replies are small, so the streaming `quick_xml` reader is drained once into
//! an owned `Element` tree and navigation happens on that tree. Text is kept
//! exactly as sent. Only text that precedes the first child is recorded, and
//! whitespace-only text on an element that has children is indentation, not
//! content.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RtmError;

/// One element of a parsed reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
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

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First direct child named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Every descendant reached by the `/`-separated relative `path`, in
    /// document order. `"deleted/taskseries"` yields the `taskseries`
    /// children of every `deleted` child.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut current = vec![self];
        for step in path.split('/') {
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(move |c| c.name == step))
                .collect();
        }
        current
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self, RtmError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(xml_error)?
            .to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(xml_error)?
                .to_string();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            text: None,
            children: Vec::new(),
        })
    }
}

/// Parse a complete XML document into its root element.
pub fn parse(input: &str) -> Result<Element, RtmError> {
    let mut reader = Reader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| RtmError::Xml("unbalanced closing tag".to_string()))?;
                drop_indentation(&mut element);
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(xml_error)?;
                push_text(&mut stack, &text);
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data);
                push_text(&mut stack, &text);
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(RtmError::Xml("unexpected end of document".to_string()));
    }
    root.ok_or_else(|| RtmError::Xml("document has no root element".to_string()))
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), RtmError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(RtmError::Xml("multiple root elements".to_string())),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) {
    if let Some(current) = stack.last_mut() {
        if current.children.is_empty() {
            current.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

fn drop_indentation(element: &mut Element) {
    let blank = element
        .text
        .as_deref()
        .is_some_and(|text| text.trim().is_empty());
    if blank && !element.children.is_empty() {
        element.text = None;
    }
}

fn xml_error(err: impl std::fmt::Display) -> RtmError {
    RtmError::Xml(err.to_string())
}
