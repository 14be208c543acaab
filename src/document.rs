//! XML documents exchanged between views: structure templates going into the
//! render step and rendered fragments coming out of it.
//!
//! A structure template may contain placeholder elements,
//! `<child_view name="ChildName"/>`, each slot to be filled by the rendered
//! fragment of the child view registered under that name.

use std::collections::HashMap;
use std::fmt;

use xmltree::{Element, EmitterConfig, XMLNode};

use crate::errors::{RenderError, RenderResult};

/// Marker tag identifying a placeholder element in a structure template.
pub const CHILD_VIEW_TAG: &str = "child_view";

/// Attribute naming the child view that fills a placeholder.
pub const NAME_ATTR: &str = "name";

/// Attribute stamped onto placeholders whose name matches no registered child.
pub const NOT_FOUND_ATTR: &str = "child_not_found";

/// A parsed structure template owned by a view node.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureTemplate {
    root: Element,
}

impl StructureTemplate {
    pub fn parse(xml: &str) -> RenderResult<Self> {
        let root = Element::parse(xml.as_bytes())?;
        Ok(Self { root })
    }

    pub fn from_element(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Placeholder names in document order, duplicates included.
    ///
    /// A placeholder without a `name` attribute makes the template
    /// unprocessable and fails with [`RenderError::Structural`].
    pub fn placeholder_names(&self) -> RenderResult<Vec<String>> {
        let mut names = Vec::new();
        collect_placeholder_names(&self.root, &mut names)?;
        Ok(names)
    }

    /// Walks every placeholder element in document order, letting the caller
    /// inspect or mutate it in place.
    pub fn visit_placeholders_mut<F>(&mut self, mut visit: F) -> RenderResult<()>
    where
        F: FnMut(&mut Element) -> RenderResult<()>,
    {
        walk_placeholders_mut(&mut self.root, &mut visit)
    }
}

/// A rendered document produced by a view's render step.
///
/// Free of placeholders for every child that was registered; unresolved
/// placeholders remain in place carrying the [`NOT_FOUND_ATTR`] marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    root: Element,
}

impl Fragment {
    pub fn from_element(root: Element) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Descendant elements with the given tag name, in document order.
    pub fn elements_named(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_named(&self.root, tag, &mut found);
        found
    }

    /// Replaces each placeholder whose name has a computed fragment with that
    /// fragment's content, at the placeholder's position. Placeholders naming
    /// no computed fragment stay in place.
    ///
    /// Placeholders are re-located here by tag and `name` attribute rather
    /// than by node identity: the base render step is free to rebuild the
    /// document, as long as placeholders survive it with tag and attributes
    /// intact.
    pub(crate) fn splice(&mut self, fragments: &HashMap<String, Fragment>) -> RenderResult<()> {
        // The document root may itself be a placeholder; the child fragment
        // then becomes the whole document.
        if self.root.name == CHILD_VIEW_TAG {
            let name = placeholder_name(&self.root)?;
            if let Some(fragment) = fragments.get(&name) {
                self.root = fragment.root.clone();
            }
            return Ok(());
        }
        splice_into(&mut self.root, fragments)
    }

    pub fn to_xml_string(&self) -> RenderResult<String> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(false);
        self.root
            .write_with_config(&mut buf, config)
            .map_err(|e| RenderError::Structural {
                reason: e.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_xml_string() {
            Ok(s) => f.write_str(&s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Reads the required `name` attribute of a placeholder element.
pub fn placeholder_name(el: &Element) -> RenderResult<String> {
    el.attributes
        .get(NAME_ATTR)
        .cloned()
        .ok_or_else(|| RenderError::Structural {
            reason: format!("placeholder <{CHILD_VIEW_TAG}> missing {NAME_ATTR} attribute"),
        })
}

fn collect_placeholder_names(el: &Element, names: &mut Vec<String>) -> RenderResult<()> {
    if el.name == CHILD_VIEW_TAG {
        names.push(placeholder_name(el)?);
        return Ok(());
    }
    for node in &el.children {
        if let Some(child) = node.as_element() {
            collect_placeholder_names(child, names)?;
        }
    }
    Ok(())
}

fn walk_placeholders_mut(
    el: &mut Element,
    visit: &mut dyn FnMut(&mut Element) -> RenderResult<()>,
) -> RenderResult<()> {
    if el.name == CHILD_VIEW_TAG {
        return visit(el);
    }
    for node in el.children.iter_mut() {
        if let Some(child) = node.as_mut_element() {
            walk_placeholders_mut(child, visit)?;
        }
    }
    Ok(())
}

fn collect_named<'a>(el: &'a Element, tag: &str, found: &mut Vec<&'a Element>) {
    if el.name == tag {
        found.push(el);
    }
    for node in &el.children {
        if let Some(child) = node.as_element() {
            collect_named(child, tag, found);
        }
    }
}

fn splice_into(parent: &mut Element, fragments: &HashMap<String, Fragment>) -> RenderResult<()> {
    let nodes = std::mem::take(&mut parent.children);
    for node in nodes {
        match node {
            XMLNode::Element(el) if el.name == CHILD_VIEW_TAG => {
                let name = placeholder_name(&el)?;
                if let Some(fragment) = fragments.get(&name) {
                    parent.children.push(XMLNode::Element(fragment.root.clone()));
                } else {
                    parent.children.push(XMLNode::Element(el));
                }
            }
            XMLNode::Element(mut el) => {
                splice_into(&mut el, fragments)?;
                parent.children.push(XMLNode::Element(el));
            }
            other => parent.children.push(other),
        }
    }
    Ok(())
}
