use docrender_core::{update, AppState, Effect, Msg, Phase, EXAMPLE_DOCUMENT};

fn init_logging() {
    docrender_logging::initialize_for_tests();
}

#[test]
fn session_start_loads_document_and_fetches_templates() {
    init_logging();
    let (mut state, effects) = update(
        AppState::new(),
        Msg::SessionStarted {
            document: EXAMPLE_DOCUMENT.to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::FetchTemplates]);
    let view = state.view();
    assert_eq!(view.phase, Phase::Idle);
    assert!(view.saved);
    assert!(view.log.is_empty());
    assert_eq!(view.artifact_ref, None);
    assert_eq!(view.job_id, None);
    assert_eq!(view.title.as_deref(), Some("Example Document"));
    assert!(state.consume_dirty());
}

#[test]
fn every_edit_flips_unsaved_and_schedules_latest_content() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::SessionStarted {
            document: String::new(),
        },
    );

    let (state, effects) = update(state, Msg::DocumentEdited("a".to_string()));
    assert!(!state.view().saved);
    assert_eq!(
        effects,
        vec![Effect::ScheduleSave {
            revision: 1,
            content: "a".to_string(),
        }]
    );

    let (state, effects) = update(state, Msg::DocumentEdited("ab".to_string()));
    assert_eq!(
        effects,
        vec![Effect::ScheduleSave {
            revision: 2,
            content: "ab".to_string(),
        }]
    );
    assert_eq!(state.document().revision(), 2);
}

#[test]
fn only_latest_revision_commit_marks_saved() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::DocumentEdited("a".to_string()));
    let (state, _) = update(state, Msg::DocumentEdited("ab".to_string()));

    let (state, _) = update(state, Msg::DocumentSaved { revision: 1 });
    assert!(!state.view().saved);

    let (state, _) = update(state, Msg::DocumentSaved { revision: 2 });
    assert!(state.view().saved);

    let (state, _) = update(state, Msg::DocumentEdited("abc".to_string()));
    assert!(!state.view().saved);
}
