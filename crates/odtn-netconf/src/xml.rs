//! Owned XML trees with slash-separated path queries.
//!
//! Replies are parsed once with `roxmltree` and copied into [`XmlNode`] so
//! callers can keep them beyond the lifetime of the reply string. Element
//! names are matched on their local part; namespaces are kept for reference
//! but never needed to address a node.
//!
//! Paths are relative to the node they are evaluated on and never include
//! that node's own name:
//!
//! ```text
//! <rpc-reply>                      XmlNode::parse(..)
//!   <data>
//!     <components>
//!       <component>                find_all("data/components/component")
//!         <name>port-1/1/0/C1</name>
//!         <state><type>...</type></state>
//! ```
//!
//! A path matches every node reachable through matching names, in document
//! order; [`XmlNode::find`] and [`XmlNode::first_text`] return the first one.

use crate::error::{NetconfError, NetconfResult};

/// An element with its trimmed text content and child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlNode {
    name: String,
    namespace: Option<String>,
    text: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlNode {
    /// Parses a document and returns its root element.
    pub fn parse(document: &str) -> NetconfResult<Self> {
        let doc = roxmltree::Document::parse(document)
            .map_err(|e| NetconfError::malformed(e.to_string()))?;
        Ok(Self::from_element(doc.root_element()))
    }

    fn from_element(node: roxmltree::Node<'_, '_>) -> Self {
        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_element(child));
            } else if child.is_text() {
                if let Some(t) = child.text() {
                    text.push_str(t);
                }
            }
        }

        Self {
            name: node.tag_name().name().to_string(),
            namespace: node.tag_name().namespace().map(str::to_string),
            text: text.trim().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            children,
        }
    }

    /// Local element name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI, if the element is qualified.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Trimmed direct text content.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute value by local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All nodes matching `path`, in document order.
    pub fn find_all(&self, path: &str) -> Vec<&XmlNode> {
        let mut current = vec![self];
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|n| n.children.iter().filter(move |c| c.name == segment))
                .collect();
            if current.is_empty() {
                break;
            }
        }
        current
    }

    /// First node matching `path`.
    pub fn find(&self, path: &str) -> Option<&XmlNode> {
        self.find_all(path).into_iter().next()
    }

    /// Text of the first node matching `path`. Empty elements count as absent.
    pub fn first_text(&self, path: &str) -> Option<String> {
        self.find(path)
            .map(XmlNode::text)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }

    /// Like [`first_text`](Self::first_text) with a fallback.
    pub fn text_or(&self, path: &str, default: &str) -> String {
        self.first_text(path).unwrap_or_else(|| default.to_string())
    }
}
