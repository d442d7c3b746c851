use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use docrender_logging::{docrender_info, docrender_warn};
use thiserror::Error;

use crate::export::export_artifact;
use crate::guard::{ChannelEventSink, EventSink, PersistenceGuard};
use crate::persist::DocumentStore;
use crate::service::{submit_with_deadline, CompileService, EngineSettings, ReqwestCompileService};
use crate::{CompileError, EngineEvent, RenderRequest, RequestId, Revision};

enum EngineCommand {
    Render {
        render_id: RequestId,
        request: RenderRequest,
    },
    ExtractSource {
        extract_id: RequestId,
        request: RenderRequest,
    },
    ListTemplates,
    ScheduleSave {
        revision: Revision,
        content: String,
    },
    Export {
        artifact_ref: String,
        title: Option<String>,
    },
    Flush {
        done: mpsc::Sender<()>,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("compile service unusable: {0}")]
    Service(#[from] CompileError),
}

/// Runs the IO side of a session on a dedicated thread with its own tokio runtime.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Arc<Mutex<mpsc::Receiver<EngineEvent>>>,
}

impl EngineHandle {
    pub fn new(
        settings: EngineSettings,
        store: Arc<dyn DocumentStore>,
        output_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let service = Arc::new(ReqwestCompileService::new(settings.clone())?);
        Self::with_service(service, store, settings, output_dir)
    }

    pub fn with_service(
        service: Arc<dyn CompileService>,
        store: Arc<dyn DocumentStore>,
        settings: EngineSettings,
        output_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
            let mut guard = PersistenceGuard::new(
                store,
                sink.clone(),
                settings.save_delay,
                runtime.handle().clone(),
            );
            let output_dir = Arc::new(output_dir);
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::ScheduleSave { revision, content } => {
                        guard.schedule(revision, content);
                    }
                    EngineCommand::Flush { done } => {
                        guard.flush();
                        let _ = done.send(());
                    }
                    command => {
                        let service = service.clone();
                        let sink = sink.clone();
                        let output_dir = output_dir.clone();
                        let deadline = settings.render_deadline;
                        runtime.spawn(async move {
                            handle_command(
                                service.as_ref(),
                                sink.as_ref(),
                                command,
                                deadline,
                                &output_dir,
                            )
                            .await;
                        });
                    }
                }
            }
            // Sender dropped: commit whatever is still pending before the runtime goes.
            guard.flush();
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn render(&self, render_id: RequestId, request: RenderRequest) {
        self.send(EngineCommand::Render { render_id, request });
    }

    pub fn extract_source(&self, extract_id: RequestId, request: RenderRequest) {
        self.send(EngineCommand::ExtractSource {
            extract_id,
            request,
        });
    }

    pub fn list_templates(&self) {
        self.send(EngineCommand::ListTemplates);
    }

    pub fn schedule_save(&self, revision: Revision, content: String) {
        self.send(EngineCommand::ScheduleSave { revision, content });
    }

    pub fn export(&self, artifact_ref: String, title: Option<String>) {
        self.send(EngineCommand::Export {
            artifact_ref,
            title,
        });
    }

    /// Commits any debounced save immediately; waits at most `timeout` for it.
    pub fn flush(&self, timeout: Duration) -> bool {
        let (done, wait) = mpsc::channel();
        self.send(EngineCommand::Flush { done });
        wait.recv_timeout(timeout).is_ok()
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            docrender_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(
    service: &dyn CompileService,
    sink: &dyn EventSink,
    command: EngineCommand,
    deadline: Option<Duration>,
    output_dir: &Path,
) {
    match command {
        EngineCommand::Render { render_id, request } => {
            docrender_info!(
                "Render {} template={} content_len={}",
                render_id,
                request.template,
                request.content.len()
            );
            sink.emit(EngineEvent::RenderDispatched { render_id });
            let result = submit_with_deadline(service, &request, deadline).await;
            match &result {
                Ok(response) => docrender_info!(
                    "Render {} answered success={} pdf={}",
                    render_id,
                    response.success,
                    response.pdf_url.is_some()
                ),
                Err(err) => docrender_warn!("Render {} failed: {}", render_id, err),
            }
            sink.emit(EngineEvent::RenderCompleted { render_id, result });
        }
        EngineCommand::ExtractSource {
            extract_id,
            request,
        } => {
            let result = service.extract_source(&request).await;
            if let Err(err) = &result {
                docrender_warn!("Source extract {} failed: {}", extract_id, err);
            }
            sink.emit(EngineEvent::SourceExtracted { extract_id, result });
        }
        EngineCommand::ListTemplates => {
            let result = service.list_templates().await;
            if let Err(err) = &result {
                docrender_warn!("Template list unavailable: {}", err);
            }
            sink.emit(EngineEvent::TemplatesListed { result });
        }
        EngineCommand::Export {
            artifact_ref,
            title,
        } => {
            let result = export_artifact(service, &artifact_ref, title.as_deref(), output_dir)
                .await
                .map_err(|err| err.to_string());
            sink.emit(EngineEvent::ArtifactExported { result });
        }
        // Handled on the engine thread itself.
        EngineCommand::ScheduleSave { .. } | EngineCommand::Flush { .. } => {}
    }
}
