//! Recursive composite render step.
//!
//! Rendering a view first renders every child referenced by a placeholder in
//! its template, then applies the base template render, and finally splices
//! each child's fragment into the rendered document at the matching
//! placeholder. The result of a subtree render is the complete document for
//! that subtree; at the root it is the complete report body.

use std::collections::HashMap;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::document::{placeholder_name, Fragment, StructureTemplate, NOT_FOUND_ATTR};
use crate::errors::{RenderError, RenderResult};
use crate::view::{RenderState, ViewArena};

/// Base (non-composite) render step applied to a view's own template.
///
/// The surrounding report pipeline applies stylesheets here. The contract is
/// only that placeholder elements survive the step with tag and attributes
/// intact; their node identity may change, which is why splicing re-locates
/// them in the rendered document instead of holding on to template nodes.
pub trait TemplateRender {
    fn render_template(&self, template: &StructureTemplate) -> RenderResult<Fragment>;
}

/// Base render that emits the template unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityRender;

impl TemplateRender for IdentityRender {
    fn render_template(&self, template: &StructureTemplate) -> RenderResult<Fragment> {
        Ok(Fragment::from_element(template.root().clone()))
    }
}

/// Drives the depth-first render of a view tree.
///
/// All query state lives inside a single `render` call, so engines can be
/// shared freely across trees.
#[derive(Debug)]
pub struct RenderEngine<B: TemplateRender = IdentityRender> {
    base: B,
}

impl RenderEngine<IdentityRender> {
    pub fn new() -> Self {
        Self {
            base: IdentityRender,
        }
    }
}

impl Default for RenderEngine<IdentityRender> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: TemplateRender> RenderEngine<B> {
    pub fn with_base(base: B) -> Self {
        Self { base }
    }

    /// Renders the subtree rooted at `index` and returns its fragment.
    ///
    /// Children are rendered in placeholder-scan order of the pre-render
    /// template. A placeholder naming no registered child is stamped with
    /// `child_not_found="1"` and left in the output; a malformed template is
    /// fatal for the whole subtree. Each call recomputes the result and
    /// stores it as the node's rendered fragment.
    #[instrument(level = "debug", skip(self, tree))]
    pub fn render(&self, tree: &mut ViewArena, index: Index) -> RenderResult<Fragment> {
        let (name, template) = {
            let node = tree.node(index).ok_or(RenderError::ViewNotFound)?;
            if node.state == RenderState::Rendering {
                return Err(RenderError::CycleDetected {
                    name: node.data.name.clone(),
                });
            }
            (node.data.name.clone(), node.data.template.clone())
        };
        debug!(view = %name, "rendering view");
        tree.node_mut(index).ok_or(RenderError::ViewNotFound)?.state = RenderState::Rendering;

        let outcome = self.render_node(tree, index, template);

        let node = tree.node_mut(index).ok_or(RenderError::ViewNotFound)?;
        match outcome {
            Ok(fragment) => {
                node.state = RenderState::Rendered;
                node.rendered = Some(fragment.clone());
                Ok(fragment)
            }
            Err(e) => {
                node.state = RenderState::Unrendered;
                node.rendered = None;
                Err(e)
            }
        }
    }

    fn render_node(
        &self,
        tree: &mut ViewArena,
        index: Index,
        mut template: StructureTemplate,
    ) -> RenderResult<Fragment> {
        // Scan the pre-render template for placeholders in document order.
        let names = template.placeholder_names()?;

        // Render each referenced child depth-first. Duplicate placeholder
        // names re-render the child once per occurrence; the mapping keeps
        // the latest (content-identical) fragment.
        let mut fragments: HashMap<String, Fragment> = HashMap::new();
        for name in &names {
            let child = tree
                .node(index)
                .ok_or(RenderError::ViewNotFound)?
                .children
                .get(name)
                .copied();
            match child {
                Some(child_index) => {
                    let fragment = self.render(tree, child_index)?;
                    fragments.insert(name.clone(), fragment);
                }
                None => {
                    debug!(placeholder = %name, "no child view registered, leaving marker");
                }
            }
        }

        // Stamp unresolved placeholders before the base render so the marker
        // travels through it into the output.
        template.visit_placeholders_mut(|el| {
            if !fragments.contains_key(&placeholder_name(el)?) {
                el.attributes
                    .insert(NOT_FOUND_ATTR.to_string(), "1".to_string());
            }
            Ok(())
        })?;

        // Base render, then re-locate placeholders in the rendered document
        // and splice the child fragments in.
        let mut rendered = self.base.render_template(&template)?;
        rendered.splice(&fragments)?;
        Ok(rendered)
    }
}
