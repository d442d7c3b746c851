//! Docrender core: pure render-session state machine and view-model helpers.
mod artifact;
mod effect;
mod example;
mod frontmatter;
mod msg;
mod state;
mod update;
mod view_model;

pub use artifact::{bust_cache, CacheBuster};
pub use effect::{CompileRequest, Effect};
pub use example::EXAMPLE_DOCUMENT;
pub use frontmatter::document_title;
pub use msg::Msg;
pub use state::{
    AppState, DocumentBuffer, ExportStatus, ExtractId, OutcomeKind, Phase, RenderId,
    RenderOutcome, Revision, SourceExtract, DEFAULT_PREFERRED_TEMPLATE,
};
pub use update::{update, LOG_CONVERSION_OK, LOG_PDF_OK, LOG_SENDING, LOG_WARN_NO_PDF};
pub use view_model::AppViewModel;
