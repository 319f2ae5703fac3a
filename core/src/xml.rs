//! Generic XML node tree.
//!
//! Every Lighthouse response is flattened into [`Node`] values before any
//! field decoding happens, so the decoder and entity builder never see the
//! XML crate directly.

use std::collections::BTreeMap;

use crate::error::ApiError;

/// One XML element with its attributes, text and element children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub cdata: Option<String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn from_element(element: roxmltree::Node<'_, '_>) -> Self {
        let children: Vec<Node> = element
            .children()
            .filter(|n| n.is_element())
            .map(Node::from_element)
            .collect();

        let text: String = element
            .children()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect();

        // Container elements only carry indentation between their children.
        let text = if children.is_empty() {
            text
        } else {
            text.trim().to_string()
        };

        Node {
            name: element.tag_name().name().to_string(),
            attributes: element
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            cdata: (!text.is_empty()).then_some(text),
            children,
        }
    }
}

/// Parse a whole document and return its root element.
pub fn parse(xml: &str) -> Result<Node, ApiError> {
    let document = roxmltree::Document::parse(xml)?;
    Ok(Node::from_element(document.root_element()))
}
