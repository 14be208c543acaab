//! Composite view rendering for XML report templates.
//!
//! A report body is produced by a tree of named views. Each view owns a
//! structure template, an XML document whose `<child_view name="..."/>`
//! placeholder elements mark where the rendered fragments of child views
//! belong. Rendering is depth-first: a view renders its children, applies its
//! own base template render, then splices each child's fragment into the
//! rendered document in place of the matching placeholder.
//!
//! A placeholder that names no registered child is not an error: it stays in
//! the output stamped with `child_not_found="1"`, so one missing section
//! never aborts a whole report.
//!
//! ```
//! use rsview::{RenderEngine, StructureTemplate, ViewArena, ViewData};
//!
//! # fn main() -> rsview::RenderResult<()> {
//! let mut tree = ViewArena::new();
//! let root = tree.insert_view(
//!     ViewData::new("report", StructureTemplate::parse(
//!         r#"<report><child_view name="body"/></report>"#,
//!     )?),
//!     None,
//! );
//! tree.insert_view(
//!     ViewData::new("body", StructureTemplate::parse("<p>Hello</p>")?),
//!     Some(root),
//! );
//!
//! let fragment = RenderEngine::new().render(&mut tree, root)?;
//! assert!(fragment.elements_named("child_view").is_empty());
//! # Ok(())
//! # }
//! ```

pub mod document;
pub mod errors;
pub mod render;
pub mod util;
pub mod view;

pub use document::{Fragment, StructureTemplate, CHILD_VIEW_TAG, NAME_ATTR, NOT_FOUND_ATTR};
pub use errors::{RenderError, RenderResult};
pub use render::{IdentityRender, RenderEngine, TemplateRender};
pub use view::{RenderState, ViewArena, ViewData, ViewNode};
