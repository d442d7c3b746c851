use std::path::{Path, PathBuf};

use docrender_logging::docrender_info;

use crate::filename::export_filename;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::{CompileError, CompileService};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("download failed: {0}")]
    Download(#[from] CompileError),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Downloads the artifact and writes it to `output_dir` under a title-derived name.
pub async fn export_artifact(
    service: &dyn CompileService,
    artifact_ref: &str,
    title: Option<&str>,
    output_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let bytes = service.fetch_artifact(artifact_ref).await?;
    let filename = export_filename(title);
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    let path = writer.write(&filename, &bytes)?;
    docrender_info!("Exported {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}
