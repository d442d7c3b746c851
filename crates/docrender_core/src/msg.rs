#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Initial buffer read at session start (durable copy or the example document).
    SessionStarted { document: String },
    /// User edited the document buffer; carries the full new text.
    DocumentEdited(String),
    /// Durable storage committed the given revision.
    DocumentSaved { revision: crate::Revision },
    /// Template list fetched from the backend.
    TemplatesLoaded(Vec<String>),
    /// User picked a template by name.
    TemplateSelected(String),
    /// User clicked Render (or used the shortcut).
    RenderRequested,
    /// Engine handed the render request to the transport.
    RenderDispatched { render_id: crate::RenderId },
    /// Engine finished a render job, successfully or not.
    RenderCompleted {
        render_id: crate::RenderId,
        outcome: crate::RenderOutcome,
        /// Wall-clock milliseconds at completion, feeds the cache-busting discriminator.
        completed_at_ms: u64,
    },
    /// User asked for the intermediate source of the current buffer.
    SourceExtractRequested,
    SourceExtracted {
        extract_id: crate::ExtractId,
        result: Result<String, String>,
    },
    /// User cleared the log panel.
    LogResetRequested,
    /// User asked to save the current artifact locally.
    ExportRequested,
    ExportFinished { result: Result<String, String> },
}
