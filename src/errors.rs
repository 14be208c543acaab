use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no child view registered under name: {name}")]
    ChildNotFound { name: String },

    #[error("view index no longer present in arena")]
    ViewNotFound,

    #[error("failed to parse structure template: {0}")]
    Parse(#[from] xmltree::ParseError),

    #[error("template structure cannot be processed: {reason}")]
    Structural { reason: String },

    #[error("cycle detected in view hierarchy at: {name}")]
    CycleDetected { name: String },
}

pub type RenderResult<T> = Result<T, RenderError>;
