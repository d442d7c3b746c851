//! Docrender engine: compile-service client, persistence and effect execution.
mod engine;
mod export;
mod filename;
mod guard;
mod persist;
mod service;
mod types;

pub use engine::{EngineError, EngineHandle};
pub use export::{export_artifact, ExportError};
pub use filename::export_filename;
pub use guard::{ChannelEventSink, EventSink, PersistenceGuard};
pub use persist::{ensure_dir, AtomicFileWriter, DocumentStore, FileDocumentStore, PersistError, DOCUMENT_KEY};
pub use service::{submit_with_deadline, CompileService, EngineSettings, ReqwestCompileService};
pub use types::{
    CompileError, EngineEvent, FailureKind, RenderRequest, RenderResponse, RequestId, Revision,
};
