use crate::{ExtractId, RenderId, Revision};

/// Body sent to the compile capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub content: String,
    pub template: String,
    pub compile: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the backend for the available templates.
    FetchTemplates,
    /// (Re)start the debounce timer for a durable save of `content`.
    ScheduleSave { revision: Revision, content: String },
    SubmitRender {
        render_id: RenderId,
        request: CompileRequest,
    },
    /// Non-compiling submission followed by a fetch of the per-job source.
    SubmitSourceExtract {
        extract_id: ExtractId,
        request: CompileRequest,
    },
    ExportArtifact {
        artifact_ref: String,
        title: Option<String>,
    },
}
