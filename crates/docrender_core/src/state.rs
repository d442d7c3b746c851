use std::time::Duration;

use crate::artifact::CacheBuster;
use crate::frontmatter::document_title;
use crate::view_model::AppViewModel;

pub type RenderId = u64;
pub type ExtractId = u64;
pub type Revision = u64;

pub const DEFAULT_PREFERRED_TEMPLATE: &str = "matnoble";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    /// Presentational sub-state of `Submitting`: the request is on the wire.
    Compiling,
    Succeeded,
    Failed,
}

impl Phase {
    pub fn is_in_flight(self) -> bool {
        matches!(self, Phase::Submitting | Phase::Compiling)
    }
}

/// How a finished render job ended, as reported by the effect runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// Backend accepted and converted the document.
    Compiled {
        job_id: Option<String>,
        backend_log: Option<String>,
        artifact: Option<String>,
    },
    /// Backend answered but reported a failure (flag or non-success status).
    Rejected {
        backend_log: Option<String>,
        detail: String,
    },
    /// The backend could not be reached or the response was unreadable.
    TransportFailed { reason: String },
    /// Local deadline elapsed with no response.
    TimedOut { after: Duration },
}

/// Summary of the most recent finished render, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    NewArtifact,
    /// Succeeded but the backend returned no artifact; the previous one is still shown.
    NoArtifact,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentBuffer {
    text: String,
    revision: Revision,
    saved: bool,
}

impl DocumentBuffer {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceExtract {
    #[default]
    None,
    Pending {
        extract_id: ExtractId,
    },
    Ready {
        source: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportStatus {
    #[default]
    None,
    Pending,
    Written {
        path: String,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct RenderSession {
    phase: Phase,
    log: Vec<String>,
    job_id: Option<String>,
    artifact_ref: Option<String>,
    in_flight: Option<RenderId>,
    last_outcome: Option<OutcomeKind>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    document: DocumentBuffer,
    session: RenderSession,
    templates: Vec<String>,
    selected_template: Option<String>,
    preferred_template: String,
    source: SourceExtract,
    export: ExportStatus,
    cache_buster: CacheBuster,
    next_render_id: RenderId,
    next_extract_id: ExtractId,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_preferred_template(DEFAULT_PREFERRED_TEMPLATE)
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferred_template(preferred: impl Into<String>) -> Self {
        Self {
            document: DocumentBuffer::default(),
            session: RenderSession::default(),
            templates: Vec::new(),
            selected_template: None,
            preferred_template: preferred.into(),
            source: SourceExtract::None,
            export: ExportStatus::None,
            cache_buster: CacheBuster::default(),
            next_render_id: 1,
            next_extract_id: 1,
            dirty: false,
        }
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.session.phase,
            log: self.session.log.join("\n"),
            job_id: self.session.job_id.clone(),
            artifact_ref: self.session.artifact_ref.clone(),
            last_outcome: self.session.last_outcome,
            saved: self.document.saved,
            title: document_title(&self.document.text),
            templates: self.templates.clone(),
            selected_template: self.selected_template.clone(),
            source: self.source.clone(),
            export: self.export.clone(),
            dirty: self.dirty,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn document(&self) -> &DocumentBuffer {
        &self.document
    }

    pub fn artifact_ref(&self) -> Option<&str> {
        self.session.artifact_ref.as_deref()
    }

    pub fn selected_template(&self) -> Option<&str> {
        self.selected_template.as_deref()
    }

    /// Returns whether the state changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn load_document(&mut self, text: String) {
        self.document = DocumentBuffer {
            text,
            revision: 0,
            saved: true,
        };
        self.mark_dirty();
    }

    pub(crate) fn edit_document(&mut self, text: String) -> Revision {
        self.document.text = text;
        self.document.revision += 1;
        self.document.saved = false;
        self.mark_dirty();
        self.document.revision
    }

    /// Only a commit of the latest revision flips the indicator back to saved.
    pub(crate) fn apply_saved(&mut self, revision: Revision) {
        if revision == self.document.revision && !self.document.saved {
            self.document.saved = true;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_templates(&mut self, templates: Vec<String>) {
        self.selected_template = if templates.iter().any(|t| *t == self.preferred_template) {
            Some(self.preferred_template.clone())
        } else {
            templates.first().cloned()
        };
        self.templates = templates;
        self.mark_dirty();
    }

    pub(crate) fn select_template(&mut self, name: &str) -> bool {
        if self.selected_template.as_deref() == Some(name) {
            return false;
        }
        if !self.templates.iter().any(|t| t == name) {
            return false;
        }
        self.selected_template = Some(name.to_string());
        self.mark_dirty();
        true
    }

    pub(crate) fn begin_render(&mut self, initial_line: &str) -> RenderId {
        let render_id = self.next_render_id;
        self.next_render_id += 1;
        self.session.phase = Phase::Submitting;
        self.session.log = vec![initial_line.to_string()];
        self.session.job_id = None;
        self.session.in_flight = Some(render_id);
        self.mark_dirty();
        render_id
    }

    /// Fails a render before anything is submitted.
    pub(crate) fn fail_render_locally(&mut self, line: String) {
        self.session.phase = Phase::Failed;
        self.session.log = vec![line];
        self.session.job_id = None;
        self.session.last_outcome = Some(OutcomeKind::Failed);
        self.mark_dirty();
    }

    pub(crate) fn is_current_render(&self, render_id: RenderId) -> bool {
        self.session.in_flight == Some(render_id)
    }

    pub(crate) fn mark_compiling(&mut self, render_id: RenderId) {
        if self.is_current_render(render_id) && self.session.phase == Phase::Submitting {
            self.session.phase = Phase::Compiling;
            self.mark_dirty();
        }
    }

    pub(crate) fn append_log(&mut self, chunk: impl Into<String>) {
        self.session.log.push(chunk.into());
        self.mark_dirty();
    }

    pub(crate) fn finish_render(&mut self, phase: Phase, outcome: OutcomeKind) {
        self.session.phase = phase;
        self.session.in_flight = None;
        self.session.last_outcome = Some(outcome);
        self.mark_dirty();
    }

    pub(crate) fn set_job_id(&mut self, job_id: Option<String>) {
        self.session.job_id = job_id;
    }

    pub(crate) fn store_artifact(&mut self, artifact: &str, completed_at_ms: u64) {
        let discriminator = self.cache_buster.next(completed_at_ms);
        self.session.artifact_ref = Some(crate::artifact::bust_cache(artifact, discriminator));
        self.mark_dirty();
    }

    pub(crate) fn reset_log(&mut self) {
        if !self.session.log.is_empty() {
            self.session.log.clear();
            self.mark_dirty();
        }
    }

    pub(crate) fn begin_extract(&mut self) -> ExtractId {
        let extract_id = self.next_extract_id;
        self.next_extract_id += 1;
        self.source = SourceExtract::Pending { extract_id };
        self.mark_dirty();
        extract_id
    }

    pub(crate) fn apply_extract(&mut self, extract_id: ExtractId, result: Result<String, String>) {
        if self.source != (SourceExtract::Pending { extract_id }) {
            return;
        }
        self.source = match result {
            Ok(source) => SourceExtract::Ready { source },
            Err(reason) => SourceExtract::Failed { reason },
        };
        self.mark_dirty();
    }

    pub(crate) fn export_status(&self) -> &ExportStatus {
        &self.export
    }

    pub(crate) fn set_export(&mut self, status: ExportStatus) {
        self.export = status;
        self.mark_dirty();
    }
}
