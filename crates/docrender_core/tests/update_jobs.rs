use docrender_core::{
    update, AppState, CompileRequest, Effect, Msg, OutcomeKind, Phase, RenderId, RenderOutcome,
    LOG_CONVERSION_OK, LOG_PDF_OK, LOG_SENDING, LOG_WARN_NO_PDF,
};

fn ready_session(document: &str) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::SessionStarted {
            document: String::new(),
        },
    );
    let (state, _) = update(state, Msg::TemplatesLoaded(vec!["matnoble".to_string()]));
    let (state, _) = update(state, Msg::DocumentEdited(document.to_string()));
    state
}

fn start_render(state: AppState) -> (AppState, RenderId) {
    let (state, effects) = update(state, Msg::RenderRequested);
    let render_id = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitRender { render_id, .. } => Some(*render_id),
            _ => None,
        })
        .expect("submit effect");
    (state, render_id)
}

fn complete(state: AppState, render_id: RenderId, outcome: RenderOutcome, at: u64) -> AppState {
    let (state, effects) = update(
        state,
        Msg::RenderCompleted {
            render_id,
            outcome,
            completed_at_ms: at,
        },
    );
    assert!(effects.is_empty());
    state
}

fn compiled(artifact: Option<&str>) -> RenderOutcome {
    RenderOutcome::Compiled {
        job_id: Some("ab12cd34".to_string()),
        backend_log: None,
        artifact: artifact.map(ToOwned::to_owned),
    }
}

#[test]
fn render_submits_current_buffer_with_compile_flag() {
    let state = ready_session("# Title\n");
    let (state, effects) = update(state, Msg::RenderRequested);

    assert_eq!(
        effects,
        vec![Effect::SubmitRender {
            render_id: 1,
            request: CompileRequest {
                content: "# Title\n".to_string(),
                template: "matnoble".to_string(),
                compile: true,
            },
        }]
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Submitting);
    assert_eq!(view.log, LOG_SENDING);
    assert!(view.is_busy());
}

#[test]
fn successful_render_stores_busted_artifact() {
    let (state, render_id) = start_render(ready_session("# Title\n"));
    let state = complete(state, render_id, compiled(Some("/x/1.pdf")), 1_700_000_000_000);

    let view = state.view();
    assert_eq!(view.phase, Phase::Succeeded);
    assert_eq!(
        view.artifact_ref.as_deref(),
        Some("/x/1.pdf?t=1700000000000")
    );
    assert_eq!(view.job_id.as_deref(), Some("ab12cd34"));
    assert_eq!(view.last_outcome, Some(OutcomeKind::NewArtifact));
    assert_eq!(
        view.log,
        [LOG_SENDING, LOG_CONVERSION_OK, LOG_PDF_OK].join("\n")
    );
}

#[test]
fn identical_renders_yield_distinct_artifact_refs() {
    let (state, first) = start_render(ready_session("# Title\n"));
    let state = complete(state, first, compiled(Some("/x/1.pdf")), 5_000);
    let first_ref = state.view().artifact_ref.unwrap();

    // Same millisecond on the second completion.
    let (state, second) = start_render(state);
    let state = complete(state, second, compiled(Some("/x/1.pdf")), 5_000);
    let second_ref = state.view().artifact_ref.unwrap();

    assert!(first_ref.starts_with("/x/1.pdf?"));
    assert!(second_ref.starts_with("/x/1.pdf?"));
    assert_ne!(first_ref, second_ref);
}

#[test]
fn failure_keeps_previous_artifact_and_logs_detail() {
    let (state, first) = start_render(ready_session("# Title\n"));
    let state = complete(state, first, compiled(Some("/x/1.pdf")), 10);
    let good = state.view().artifact_ref;

    let (state, second) = start_render(state);
    // Starting a job must not blank the preview.
    assert_eq!(state.view().artifact_ref, good);

    let state = complete(
        state,
        second,
        RenderOutcome::Rejected {
            backend_log: Some("> Writing document.md... Done.".to_string()),
            detail: "syntax error line 4".to_string(),
        },
        20,
    );

    let view = state.view();
    assert_eq!(view.phase, Phase::Failed);
    assert!(view.log.contains("syntax error line 4"));
    assert!(view.log.contains("> Writing document.md... Done."));
    assert_eq!(view.artifact_ref, good);
    assert_eq!(view.last_outcome, Some(OutcomeKind::Failed));
}

#[test]
fn success_without_artifact_warns_and_keeps_previous() {
    let (state, first) = start_render(ready_session("# Title\n"));
    let state = complete(state, first, compiled(Some("/x/1.pdf")), 10);
    let good = state.view().artifact_ref;

    let (state, second) = start_render(state);
    let state = complete(state, second, compiled(None), 20);

    let view = state.view();
    assert_eq!(view.phase, Phase::Succeeded);
    assert_eq!(view.artifact_ref, good);
    assert!(view.log.contains(LOG_WARN_NO_PDF));
    assert_eq!(view.last_outcome, Some(OutcomeKind::NoArtifact));
}

#[test]
fn transport_failure_and_timeout_fail_the_session() {
    let (state, render_id) = start_render(ready_session("# Title\n"));
    let state = complete(
        state,
        render_id,
        RenderOutcome::TransportFailed {
            reason: "network error: connection refused".to_string(),
        },
        1,
    );
    assert_eq!(state.phase(), Phase::Failed);
    assert!(state.view().log.contains("connection refused"));
    assert_eq!(state.view().artifact_ref, None);

    let (state, render_id) = start_render(state);
    let state = complete(
        state,
        render_id,
        RenderOutcome::TimedOut {
            after: std::time::Duration::from_secs(90),
        },
        2,
    );
    let view = state.view();
    assert_eq!(view.phase, Phase::Failed);
    assert_eq!(view.last_outcome, Some(OutcomeKind::TimedOut));
    assert!(view.log.contains("no response from compile service after 90s"));
}

#[test]
fn sequential_identical_renders_have_same_log_shape() {
    let (state, first) = start_render(ready_session("# Title\n"));
    let state = complete(state, first, compiled(Some("/x/1.pdf")), 1);
    let first_log = state.view().log;

    let (state, second) = start_render(state);
    let state = complete(state, second, compiled(Some("/x/1.pdf")), 2);

    assert_eq!(state.view().log, first_log);
}

#[test]
fn backend_log_is_appended_before_status_lines() {
    let (state, render_id) = start_render(ready_session("# Title\n"));
    let state = complete(
        state,
        render_id,
        RenderOutcome::Compiled {
            job_id: None,
            backend_log: Some("> Starting LaTeXmk compilation...\n> Ready.\n".to_string()),
            artifact: Some("/build/1/document.pdf".to_string()),
        },
        3,
    );

    assert_eq!(
        state.view().log,
        [
            LOG_SENDING,
            "> Starting LaTeXmk compilation...\n> Ready.",
            LOG_CONVERSION_OK,
            LOG_PDF_OK,
        ]
        .join("\n")
    );
}

#[test]
fn dispatch_moves_only_current_job_to_compiling() {
    let (state, render_id) = start_render(ready_session("# Title\n"));
    let (state, _) = update(state, Msg::RenderDispatched { render_id: 99 });
    assert_eq!(state.phase(), Phase::Submitting);

    let (state, _) = update(state, Msg::RenderDispatched { render_id });
    assert_eq!(state.phase(), Phase::Compiling);

    let state = complete(state, render_id, compiled(Some("/x/1.pdf")), 4);
    assert_eq!(state.phase(), Phase::Succeeded);
}

#[test]
fn edits_during_render_do_not_touch_session() {
    let (state, render_id) = start_render(ready_session("# Title\n"));
    let (state, effects) = update(state, Msg::DocumentEdited("# Title\nmore\n".to_string()));

    assert_eq!(effects.len(), 1);
    assert_eq!(state.phase(), Phase::Submitting);
    assert_eq!(state.view().log, LOG_SENDING);

    let state = complete(state, render_id, compiled(Some("/x/1.pdf")), 4);
    assert_eq!(state.document().text(), "# Title\nmore\n");
    assert!(!state.document().is_saved());
}
