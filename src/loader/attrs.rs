//! Attribute and property helpers shared by the TMX and TSX parsers.

use std::str::FromStr;

use roxmltree::Node;
use tracing::warn;

use crate::error::MapError;
use crate::properties::Properties;

/// A required attribute; missing or unparsable is fatal.
pub fn required<T: FromStr>(node: Node<'_, '_>, name: &'static str) -> Result<T, MapError> {
    let tag = node.tag_name().name();
    let raw = node
        .attribute(name)
        .ok_or_else(|| MapError::missing_attribute(tag, name))?;
    raw.trim()
        .parse()
        .map_err(|_| MapError::invalid_attribute(tag, name, raw))
}

/// An optional attribute; unparsable values are logged and treated as absent.
pub fn optional<T: FromStr>(node: Node<'_, '_>, name: &'static str) -> Option<T> {
    let raw = node.attribute(name)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(
                element = node.tag_name().name(),
                attribute = name,
                value = raw,
                "ignoring unparsable attribute"
            );
            None
        }
    }
}

pub fn string(node: Node<'_, '_>, name: &str) -> String {
    node.attribute(name).unwrap_or_default().to_owned()
}

/// Tiled writes `visible="0"` for hidden layers and objects; anything else is visible.
pub fn visible(node: Node<'_, '_>) -> bool {
    !matches!(node.attribute("visible").map(str::trim), Some("0" | "false"))
}

pub fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

pub fn elements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|c| c.is_element())
}

/// Reads the `<properties>` child of `node`, if any.
///
/// A property's value comes from its `value` attribute, or from its text for multi-line
/// strings. Nameless properties are dropped.
pub fn properties(node: Node<'_, '_>) -> Properties {
    let mut out = Properties::new();
    let Some(props) = child(node, "properties") else {
        return out;
    };
    for prop in elements(props).filter(|p| p.tag_name().name() == "property") {
        let name = prop.attribute("name").unwrap_or_default();
        let value = prop
            .attribute("value")
            .or_else(|| prop.text())
            .unwrap_or_default();
        out.insert(name, value);
    }
    out
}
