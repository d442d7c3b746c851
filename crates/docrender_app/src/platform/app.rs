use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use docrender_core::{update, AppState, AppViewModel, Msg, Phase, EXAMPLE_DOCUMENT};
use docrender_engine::{
    DocumentStore, EngineEvent, EngineHandle, FileDocumentStore, PersistenceGuard,
};
use docrender_logging::{docrender_debug, docrender_info};

use super::config::AppConfig;
use super::effects::{AppEvent, EffectRunner};
use super::ui::commands::{parse_line, without_last_line, UiCommand, HELP};
use super::ui::render;

enum Flow {
    Continue,
    Quit,
}

/// Owns the session state and routes messages through `update`.
struct Session {
    state: AppState,
    shown: AppViewModel,
    runner: EffectRunner,
}

impl Session {
    fn new(preferred_template: &str, runner: EffectRunner) -> Self {
        let state = AppState::with_preferred_template(preferred_template);
        let shown = state.view();
        Self {
            state,
            shown,
            runner,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let rejected_render =
            matches!(msg, Msg::RenderRequested) && self.state.phase().is_in_flight();
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if rejected_render {
            docrender_debug!("Render request ignored: a job is already in flight");
            println!("! a render is already running");
        }
        self.runner.enqueue(effects);

        if self.state.consume_dirty() {
            let view = self.state.view();
            let mut out = io::stdout().lock();
            let _ = render::render_changes(&mut out, &self.shown, &view);
            self.shown = view;
        }
    }

    fn edit(&mut self, text: String) {
        self.dispatch(Msg::DocumentEdited(text));
    }

    fn handle_command(&mut self, command: UiCommand) -> Flow {
        match command {
            UiCommand::Append(line) => {
                let mut text = self.state.document().text().to_string();
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&line);
                text.push('\n');
                self.edit(text);
            }
            UiCommand::Pop => {
                let text = without_last_line(self.state.document().text());
                self.edit(text);
            }
            UiCommand::Reset => self.edit(EXAMPLE_DOCUMENT.to_string()),
            UiCommand::Load(path) => match fs::read_to_string(&path) {
                Ok(text) => self.edit(text),
                Err(err) => println!("! cannot read {}: {err}", path.display()),
            },
            UiCommand::Render => self.dispatch(Msg::RenderRequested),
            UiCommand::Source => {
                if self.state.selected_template().is_none() {
                    println!("! no template selected");
                }
                self.dispatch(Msg::SourceExtractRequested);
            }
            UiCommand::Templates => {
                let view = self.state.view();
                for name in &view.templates {
                    let marker = if view.selected_template.as_deref() == Some(name) {
                        '*'
                    } else {
                        ' '
                    };
                    println!("{marker} {name}");
                }
                if view.templates.is_empty() {
                    println!("! no templates loaded");
                }
            }
            UiCommand::UseTemplate(name) => {
                if !self.state.view().templates.contains(&name) {
                    println!("! unknown template {name}");
                }
                self.dispatch(Msg::TemplateSelected(name));
            }
            UiCommand::ClearLog => self.dispatch(Msg::LogResetRequested),
            UiCommand::Export => {
                if self.state.artifact_ref().is_none() {
                    println!("! nothing to export yet; render first");
                }
                self.dispatch(Msg::ExportRequested);
            }
            UiCommand::Show => {
                let view = self.state.view();
                let mut out = io::stdout().lock();
                let _ = render::render_status(&mut out, &view, self.state.document().text());
            }
            UiCommand::Help => println!("{HELP}"),
            UiCommand::Quit => return Flow::Quit,
            UiCommand::Unknown(line) => println!("! unknown command {line:?}; :help lists commands"),
        }
        Flow::Continue
    }
}

/// Once input has ended the session waits for an in-flight render, then leaves.
fn input_finished(closing: bool, phase: Phase) -> bool {
    closing && !phase.is_in_flight()
}

fn spawn_input_reader(tx: mpsc::Sender<AppEvent>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(AppEvent::Command(parse_line(&line))).is_err() {
                return;
            }
        }
        let _ = tx.send(AppEvent::InputClosed);
    });
}

fn start_engine(config: &AppConfig, store: Arc<dyn DocumentStore>) -> anyhow::Result<EngineHandle> {
    EngineHandle::new(config.engine_settings(), store, config.output_dir.clone())
        .context("starting render engine")
}

/// Interactive editing session on stdin/stdout.
pub fn run_session(config: &AppConfig) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(FileDocumentStore::new(&config.state_dir));
    let (document, restored) = PersistenceGuard::load_initial(store.as_ref(), EXAMPLE_DOCUMENT);
    docrender_info!(
        "Session start: restored={} len={} base_url={}",
        restored,
        document.len(),
        config.base_url
    );

    let engine = start_engine(config, store)?;
    let (tx, rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, tx.clone());
    spawn_input_reader(tx);

    println!("docrender: {}", config.base_url);
    println!("{HELP}");
    if !restored {
        println!("(starting from the example document)");
    }

    let mut session = Session::new(&config.preferred_template, runner);
    session.dispatch(Msg::SessionStarted { document });

    let mut closing = false;
    while let Ok(event) = rx.recv() {
        match event {
            AppEvent::Msg(msg) => session.dispatch(msg),
            AppEvent::Notice(text) => println!("! {text}"),
            AppEvent::Command(command) => {
                if let Flow::Quit = session.handle_command(command) {
                    break;
                }
            }
            // Piped input: let an in-flight render finish before leaving.
            AppEvent::InputClosed => closing = true,
        }
        if input_finished(closing, session.state.phase()) {
            break;
        }
    }

    session.runner.flush();
    let _ = io::stdout().flush();
    Ok(())
}

/// Renders one file and prints the log; returns whether the render succeeded.
pub fn run_render_once(
    config: &AppConfig,
    path: &Path,
    template: Option<String>,
) -> anyhow::Result<bool> {
    let document = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let store: Arc<dyn DocumentStore> = Arc::new(FileDocumentStore::new(&config.state_dir));
    let engine = start_engine(config, store)?;
    let (tx, rx) = mpsc::channel();
    let runner = EffectRunner::new(engine, tx);

    let preferred = template
        .clone()
        .unwrap_or_else(|| config.preferred_template.clone());
    let (mut state, effects) = update(
        AppState::with_preferred_template(preferred),
        Msg::SessionStarted { document },
    );
    match template {
        Some(name) => state = update(state, Msg::TemplatesLoaded(vec![name])).0,
        None => {
            runner.enqueue(effects);
            loop {
                match rx.recv()? {
                    AppEvent::Msg(msg @ Msg::TemplatesLoaded(_)) => {
                        state = update(state, msg).0;
                        break;
                    }
                    AppEvent::Notice(text) => bail!(text),
                    _ => {}
                }
            }
        }
    }

    let (next, effects) = update(state, Msg::RenderRequested);
    state = next;
    runner.enqueue(effects);
    while state.phase().is_in_flight() {
        match rx.recv()? {
            AppEvent::Msg(msg) => state = update(state, msg).0,
            AppEvent::Notice(text) => eprintln!("! {text}"),
            _ => {}
        }
    }

    let view = state.view();
    println!("{}", view.log);
    if let Some(artifact) = &view.artifact_ref {
        println!("artifact: {artifact}");
    }
    Ok(view.phase == Phase::Succeeded)
}

/// Prints the backend's templates, marking the preferred one.
pub fn run_list_templates(config: &AppConfig) -> anyhow::Result<()> {
    let store: Arc<dyn DocumentStore> = Arc::new(FileDocumentStore::new(&config.state_dir));
    let engine = start_engine(config, store)?;
    engine.list_templates();

    let wait = Duration::from_secs(config.request_timeout_secs.saturating_add(5));
    match engine.recv_timeout(wait) {
        Some(EngineEvent::TemplatesListed { result: Ok(templates) }) => {
            for name in templates {
                let marker = if name == config.preferred_template { '*' } else { ' ' };
                println!("{marker} {name}");
            }
            Ok(())
        }
        Some(EngineEvent::TemplatesListed { result: Err(err) }) => {
            bail!("could not list templates: {err}")
        }
        _ => bail!("no answer from {}", config.base_url),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_of_input_waits_for_running_render() {
        assert!(!input_finished(true, Phase::Submitting));
        assert!(!input_finished(true, Phase::Compiling));
        assert!(input_finished(true, Phase::Succeeded));
        assert!(input_finished(true, Phase::Failed));
        assert!(input_finished(true, Phase::Idle));
    }

    #[test]
    fn open_input_never_ends_session() {
        assert!(!input_finished(false, Phase::Idle));
        assert!(!input_finished(false, Phase::Succeeded));
    }
}
