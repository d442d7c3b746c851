use crate::{
    AppState, CompileRequest, Effect, ExportStatus, Msg, OutcomeKind, Phase, RenderOutcome,
};

pub const LOG_SENDING: &str = "Sending request...";
pub const LOG_CONVERSION_OK: &str = "Conversion successful.";
pub const LOG_PDF_OK: &str = "PDF compiled successfully.";
pub const LOG_WARN_NO_PDF: &str = "Warning: PDF URL not returned (maybe latexmk missing?).";
const NO_TEMPLATE: &str = "Error: no template selected";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::SessionStarted { document } => {
            state.load_document(document);
            vec![Effect::FetchTemplates]
        }
        Msg::DocumentEdited(text) => {
            // Edits are accepted in every phase; an in-flight render keeps its own snapshot.
            let content = text.clone();
            let revision = state.edit_document(text);
            vec![Effect::ScheduleSave { revision, content }]
        }
        Msg::DocumentSaved { revision } => {
            state.apply_saved(revision);
            Vec::new()
        }
        Msg::TemplatesLoaded(templates) => {
            state.set_templates(templates);
            Vec::new()
        }
        Msg::TemplateSelected(name) => {
            state.select_template(&name);
            Vec::new()
        }
        Msg::RenderRequested => request_render(&mut state),
        Msg::RenderDispatched { render_id } => {
            state.mark_compiling(render_id);
            Vec::new()
        }
        Msg::RenderCompleted {
            render_id,
            outcome,
            completed_at_ms,
        } => {
            if state.is_current_render(render_id) {
                apply_outcome(&mut state, outcome, completed_at_ms);
            }
            Vec::new()
        }
        Msg::SourceExtractRequested => match state.selected_template().map(ToOwned::to_owned) {
            Some(template) => {
                let request = CompileRequest {
                    content: state.document().text().to_string(),
                    template,
                    compile: false,
                };
                let extract_id = state.begin_extract();
                vec![Effect::SubmitSourceExtract {
                    extract_id,
                    request,
                }]
            }
            None => Vec::new(),
        },
        Msg::SourceExtracted { extract_id, result } => {
            state.apply_extract(extract_id, result);
            Vec::new()
        }
        Msg::LogResetRequested => {
            state.reset_log();
            Vec::new()
        }
        Msg::ExportRequested => {
            let artifact_ref = state.artifact_ref().map(ToOwned::to_owned);
            match artifact_ref {
                Some(artifact_ref) if *state.export_status() != ExportStatus::Pending => {
                    let title = crate::document_title(state.document().text());
                    state.set_export(ExportStatus::Pending);
                    vec![Effect::ExportArtifact { artifact_ref, title }]
                }
                _ => Vec::new(),
            }
        }
        Msg::ExportFinished { result } => {
            if *state.export_status() == ExportStatus::Pending {
                state.set_export(match result {
                    Ok(path) => ExportStatus::Written { path },
                    Err(reason) => ExportStatus::Failed { reason },
                });
            }
            Vec::new()
        }
    };

    (state, effects)
}

fn request_render(state: &mut AppState) -> Vec<Effect> {
    if state.phase().is_in_flight() {
        // Rejected outright: no queueing, no replacement of the active job.
        return Vec::new();
    }
    let Some(template) = state.selected_template().map(ToOwned::to_owned) else {
        state.fail_render_locally(NO_TEMPLATE.to_string());
        return Vec::new();
    };
    let request = CompileRequest {
        content: state.document().text().to_string(),
        template,
        compile: true,
    };
    let render_id = state.begin_render(LOG_SENDING);
    vec![Effect::SubmitRender { render_id, request }]
}

fn apply_outcome(state: &mut AppState, outcome: RenderOutcome, completed_at_ms: u64) {
    match outcome {
        RenderOutcome::Compiled {
            job_id,
            backend_log,
            artifact,
        } => {
            append_backend_log(state, backend_log);
            state.append_log(LOG_CONVERSION_OK);
            state.set_job_id(job_id);
            match artifact {
                Some(artifact) => {
                    state.store_artifact(&artifact, completed_at_ms);
                    state.append_log(LOG_PDF_OK);
                    state.finish_render(Phase::Succeeded, OutcomeKind::NewArtifact);
                }
                None => {
                    state.append_log(LOG_WARN_NO_PDF);
                    state.finish_render(Phase::Succeeded, OutcomeKind::NoArtifact);
                }
            }
        }
        RenderOutcome::Rejected {
            backend_log,
            detail,
        } => {
            append_backend_log(state, backend_log);
            state.append_log(format!("Error: {detail}"));
            state.finish_render(Phase::Failed, OutcomeKind::Failed);
        }
        RenderOutcome::TransportFailed { reason } => {
            state.append_log(format!("Error: {reason}"));
            state.finish_render(Phase::Failed, OutcomeKind::Failed);
        }
        RenderOutcome::TimedOut { after } => {
            state.append_log(format!(
                "Error: no response from compile service after {after:?}"
            ));
            state.finish_render(Phase::Failed, OutcomeKind::TimedOut);
        }
    }
}

fn append_backend_log(state: &mut AppState, backend_log: Option<String>) {
    if let Some(text) = backend_log {
        let text = text.trim_end();
        if !text.is_empty() {
            state.append_log(text.to_string());
        }
    }
}
