//! Schema-free navigation over a reply.
//!
//! # Design
//! A `Response` owns the parsed tree; everything else borrows it. Looking a
//! name up on a `ResponseNode` yields a `Field`, and the kind of field is
//! decided at lookup time, in this order:
//!
//! 1. `"value"`: the node's text.
//! 2. An attribute of the node.
//! 3. A nested collection from `schema::NESTED_LISTS` (e.g. `deleted` on a
//!    `list`).
//! 4. The first child with that name. Known containers (`schema::CONTAINERS`)
//!    come back as `Field::List`, anything else as `Field::Node`.
//! 5. Otherwise `Field::Absent`. Missing fields are normal in this API (a task
//!    without a due date), so this is not an error.
//!
//! Collections hold no items of their own; every access walks the tree again.

use std::fmt;

use crate::error::RtmError;
use crate::schema;
use crate::xml::{self, Element};
use crate::Resolve;

/// Name of the pseudo-field that returns a node's text.
pub const VALUE: &str = "value";

/// A successful (`stat="ok"`) reply to one method call.
#[derive(Debug, Clone)]
pub struct Response {
    method: String,
    root: Element,
}

impl Response {
    /// Parse `body` and check the `<rsp>` envelope.
    ///
    /// A `stat="fail"` envelope becomes `RtmError::MethodFailed`; any root
    /// other than `<rsp>` is `RtmError::MalformedResponse`.
    pub fn from_xml(method: &str, body: &str) -> Result<Self, RtmError> {
        let root = xml::parse(body)?;
        Self::from_element(method, root)
    }

    pub fn from_element(method: &str, root: Element) -> Result<Self, RtmError> {
        if root.name != "rsp" {
            return Err(RtmError::MalformedResponse {
                method: method.to_string(),
                detail: format!("expected <rsp> root, found <{}>", root.name),
            });
        }

        if root.attribute("stat") == Some("fail") {
            let err = root.find("err").ok_or_else(|| RtmError::MalformedResponse {
                method: method.to_string(),
                detail: "failure reply without <err>".to_string(),
            })?;
            return Err(RtmError::MethodFailed {
                method: method.to_string(),
                code: err.attribute("code").unwrap_or_default().to_string(),
                message: err.attribute("msg").unwrap_or_default().to_string(),
            });
        }

        Ok(Self {
            method: method.to_string(),
            root,
        })
    }

    /// Method this reply answers.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// View of the `<rsp>` element.
    pub fn root(&self) -> ResponseNode<'_> {
        ResponseNode::new(&self.root)
    }

    /// Shorthand for `self.root().get(name)`.
    pub fn get(&self, name: &str) -> Field<'_> {
        self.root().resolve(name)
    }
}

/// Read-only view of one element.
#[derive(Clone, Copy)]
pub struct ResponseNode<'a> {
    element: &'a Element,
}

impl<'a> ResponseNode<'a> {
    pub fn new(element: &'a Element) -> Self {
        Self { element }
    }

    pub fn name(&self) -> &'a str {
        &self.element.name
    }

    pub fn text(&self) -> Option<&'a str> {
        self.element.text.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.element.attribute(name)
    }

    /// The node's repeated children, if its tag is a known container.
    pub fn items(&self) -> Option<NodeList<'a>> {
        schema::item_tag(self.name()).map(|tag| NodeList::container(*self, tag))
    }

    /// Iterate the repeated children; empty for non-containers.
    pub fn iter(&self) -> std::vec::IntoIter<ResponseNode<'a>> {
        self.items().map(|list| list.nodes()).unwrap_or_default().into_iter()
    }

    pub fn get(&self, name: &str) -> Field<'a> {
        self.resolve(name)
    }
}

impl<'a> Resolve for ResponseNode<'a> {
    type Output = Field<'a>;

    fn resolve(&self, name: &str) -> Field<'a> {
        if name == VALUE {
            return self.text().map_or(Field::Absent, Field::Value);
        }
        if let Some(value) = self.attribute(name) {
            return Field::Value(value);
        }
        if let Some(path) = schema::nested_path(self.name(), name) {
            return Field::List(NodeList::nested(self.element, path));
        }
        match self.element.find(name) {
            Some(child) => Field::from_node(ResponseNode::new(child)),
            None => Field::Absent,
        }
    }
}

impl fmt::Debug for ResponseNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<ResponseNode {}>", self.name())
    }
}

/// Ordered collection of nodes, re-derived from the tree on every access.
#[derive(Clone, Copy)]
pub struct NodeList<'a> {
    element: &'a Element,
    path: &'static str,
    is_container: bool,
}

impl<'a> NodeList<'a> {
    /// Repeated `item_tag` children of a container node. The list also
    /// answers lookups on the container itself.
    fn container(node: ResponseNode<'a>, item_tag: &'static str) -> Self {
        Self {
            element: node.element,
            path: item_tag,
            is_container: true,
        }
    }

    /// Descendants of `element` at the relative `path`.
    fn nested(element: &'a Element, path: &'static str) -> Self {
        Self {
            element,
            path,
            is_container: false,
        }
    }

    pub fn nodes(&self) -> Vec<ResponseNode<'a>> {
        self.element
            .find_all(self.path)
            .into_iter()
            .map(ResponseNode::new)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.element.find_all(self.path).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ResponseNode<'a>> {
        self.element
            .find_all(self.path)
            .get(index)
            .copied()
            .map(ResponseNode::new)
    }

    pub fn iter(&self) -> std::vec::IntoIter<ResponseNode<'a>> {
        self.nodes().into_iter()
    }

    /// The container node, for lists produced from a container tag.
    pub fn container_node(&self) -> Option<ResponseNode<'a>> {
        self.is_container.then(|| ResponseNode::new(self.element))
    }
}

impl<'a> Resolve for NodeList<'a> {
    type Output = Field<'a>;

    fn resolve(&self, name: &str) -> Field<'a> {
        match self.container_node() {
            Some(node) => node.resolve(name),
            None => Field::Absent,
        }
    }
}

impl<'a> IntoIterator for NodeList<'a> {
    type Item = ResponseNode<'a>;
    type IntoIter = std::vec::IntoIter<ResponseNode<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &NodeList<'a> {
    type Item = ResponseNode<'a>;
    type IntoIter = std::vec::IntoIter<ResponseNode<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for NodeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<NodeList {}/{}>", self.element.name, self.path)
    }
}

/// Result of looking a name up on a node.
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    /// Node text or attribute value.
    Value(&'a str),
    /// A single nested element.
    Node(ResponseNode<'a>),
    /// A collection of repeated elements.
    List(NodeList<'a>),
    /// Nothing by that name.
    Absent,
}

impl<'a> Field<'a> {
    fn from_node(node: ResponseNode<'a>) -> Self {
        match node.items() {
            Some(list) => Field::List(list),
            None => Field::Node(node),
        }
    }

    /// Look `name` up on this field. Scalars and `Absent` yield `Absent`,
    /// so chains never fail midway.
    pub fn get(&self, name: &str) -> Field<'a> {
        self.resolve(name)
    }

    /// The scalar, if this field is one.
    pub fn as_str(&self) -> Option<&'a str> {
        match self {
            Field::Value(value) => Some(value),
            _ => None,
        }
    }

    /// Shorthand for `self.get("value").as_str()`.
    pub fn value(&self) -> Option<&'a str> {
        self.get(VALUE).as_str()
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Field::Absent)
    }

    /// The element behind this field, for nodes and container lists.
    pub fn node(&self) -> Option<ResponseNode<'a>> {
        match self {
            Field::Node(node) => Some(*node),
            Field::List(list) => list.container_node(),
            _ => None,
        }
    }

    pub fn list(&self) -> Option<NodeList<'a>> {
        match self {
            Field::List(list) => Some(*list),
            Field::Node(node) => node.items(),
            _ => None,
        }
    }

    /// Items of the collection; empty when this field is not one.
    pub fn iter(&self) -> std::vec::IntoIter<ResponseNode<'a>> {
        self.list().map(|list| list.nodes()).unwrap_or_default().into_iter()
    }

    pub fn len(&self) -> usize {
        self.list().map_or(0, |list| list.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Item `index` of the collection, or `Absent`.
    pub fn at(&self, index: usize) -> Field<'a> {
        self.list()
            .and_then(|list| list.get(index))
            .map_or(Field::Absent, Field::from_node)
    }
}

impl<'a> Resolve for Field<'a> {
    type Output = Field<'a>;

    fn resolve(&self, name: &str) -> Field<'a> {
        match self {
            Field::Node(node) => node.resolve(name),
            Field::List(list) => list.resolve(name),
            Field::Value(_) | Field::Absent => Field::Absent,
        }
    }
}
