use crate::{ExportStatus, OutcomeKind, Phase, SourceExtract};

/// Everything the presentation layer needs to draw the session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub log: String,
    pub job_id: Option<String>,
    /// Last good artifact, cache-busting suffix included.
    pub artifact_ref: Option<String>,
    pub last_outcome: Option<OutcomeKind>,
    pub saved: bool,
    pub title: Option<String>,
    pub templates: Vec<String>,
    pub selected_template: Option<String>,
    pub source: SourceExtract,
    pub export: ExportStatus,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn is_busy(&self) -> bool {
        self.phase.is_in_flight()
    }
}
