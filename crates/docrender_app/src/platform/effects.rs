use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use docrender_core::{CompileRequest, Effect, Msg, RenderOutcome};
use docrender_engine::{
    CompileError, EngineEvent, EngineHandle, FailureKind, RenderRequest, RenderResponse,
};
use docrender_logging::{docrender_debug, docrender_info, docrender_warn};

/// Everything the session loop reacts to.
#[derive(Debug)]
pub enum AppEvent {
    Msg(Msg),
    /// Something worth telling the user that does not change session state.
    Notice(String),
    Command(super::ui::commands::UiCommand),
    InputClosed,
}

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, tx: mpsc::Sender<AppEvent>) -> Self {
        let runner = Self { engine };
        runner.spawn_event_loop(tx);
        runner
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchTemplates => self.engine.list_templates(),
                Effect::ScheduleSave { revision, content } => {
                    docrender_debug!("ScheduleSave revision={} len={}", revision, content.len());
                    self.engine.schedule_save(revision, content);
                }
                Effect::SubmitRender { render_id, request } => {
                    docrender_info!("SubmitRender render_id={}", render_id);
                    self.engine.render(render_id, map_request(request));
                }
                Effect::SubmitSourceExtract {
                    extract_id,
                    request,
                } => {
                    docrender_info!("SubmitSourceExtract extract_id={}", extract_id);
                    self.engine.extract_source(extract_id, map_request(request));
                }
                Effect::ExportArtifact {
                    artifact_ref,
                    title,
                } => self.engine.export(artifact_ref, title),
            }
        }
    }

    /// Commits a pending debounced save before the process exits.
    pub fn flush(&self) {
        if !self.engine.flush(Duration::from_secs(5)) {
            docrender_warn!("Timed out flushing the pending document save");
        }
    }

    fn spawn_event_loop(&self, tx: mpsc::Sender<AppEvent>) {
        let engine = self.engine.clone();
        thread::spawn(move || loop {
            if let Some(event) = engine.try_recv() {
                let Some(app_event) = map_event(event, now_ms()) else {
                    continue;
                };
                if tx.send(app_event).is_err() {
                    break;
                }
            } else {
                thread::sleep(Duration::from_millis(20));
            }
        });
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default()
}

fn map_request(request: CompileRequest) -> RenderRequest {
    RenderRequest {
        content: request.content,
        template: request.template,
        compile: request.compile,
    }
}

pub(crate) fn map_event(event: EngineEvent, now_ms: u64) -> Option<AppEvent> {
    let msg = match event {
        EngineEvent::RenderDispatched { render_id } => Msg::RenderDispatched { render_id },
        EngineEvent::RenderCompleted { render_id, result } => Msg::RenderCompleted {
            render_id,
            outcome: map_render_result(result),
            completed_at_ms: now_ms,
        },
        EngineEvent::SourceExtracted { extract_id, result } => Msg::SourceExtracted {
            extract_id,
            result: result.map_err(|err| err.to_string()),
        },
        EngineEvent::TemplatesListed { result: Ok(list) } => Msg::TemplatesLoaded(list),
        EngineEvent::TemplatesListed { result: Err(err) } => {
            return Some(AppEvent::Notice(format!("Could not load templates: {err}")));
        }
        EngineEvent::DocumentSaved { revision } => Msg::DocumentSaved { revision },
        // Storage failures stay out of the user's way; the next edit reschedules.
        EngineEvent::DocumentSaveFailed { revision, message } => {
            docrender_warn!("Document revision {} not saved: {}", revision, message);
            return None;
        }
        EngineEvent::ArtifactExported { result } => Msg::ExportFinished {
            result: result.map(|path| path.display().to_string()),
        },
    };
    Some(AppEvent::Msg(msg))
}

pub(crate) fn map_render_result(result: Result<RenderResponse, CompileError>) -> RenderOutcome {
    match result {
        Ok(response) if response.success => RenderOutcome::Compiled {
            job_id: response.job_id,
            backend_log: response.log,
            artifact: response.pdf_url.filter(|url| !url.is_empty()),
        },
        Ok(response) => RenderOutcome::Rejected {
            backend_log: response.log,
            detail: response
                .detail
                .unwrap_or_else(|| "Render failed".to_string()),
        },
        Err(CompileError {
            kind: FailureKind::DeadlineExceeded { after },
            ..
        }) => RenderOutcome::TimedOut { after },
        Err(CompileError {
            kind: FailureKind::HttpStatus(_),
            message,
        }) => RenderOutcome::Rejected {
            backend_log: None,
            detail: message,
        },
        Err(err) => RenderOutcome::TransportFailed {
            reason: err.to_string(),
        },
    }
}
