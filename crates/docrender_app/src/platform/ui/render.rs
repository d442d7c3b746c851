use std::io::{self, Write};

use docrender_core::{AppViewModel, ExportStatus, OutcomeKind, Phase, SourceExtract};

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::Submitting => "submitting...",
        Phase::Compiling => "compiling...",
        Phase::Succeeded => "succeeded",
        Phase::Failed => "failed",
    }
}

/// Prints what changed between two views.
pub fn render_changes(
    out: &mut impl Write,
    previous: &AppViewModel,
    current: &AppViewModel,
) -> io::Result<()> {
    if previous.log != current.log {
        render_log_delta(out, &previous.log, &current.log)?;
    }
    if previous.phase != current.phase {
        writeln!(out, "[{}]", phase_label(current.phase))?;
    }
    if previous.artifact_ref != current.artifact_ref {
        if let Some(artifact) = &current.artifact_ref {
            writeln!(out, "preview: {artifact}")?;
        }
    } else if current.phase == Phase::Succeeded
        && previous.phase != Phase::Succeeded
        && current.last_outcome == Some(OutcomeKind::NoArtifact)
    {
        writeln!(out, "preview unchanged: no new PDF")?;
    }
    if previous.saved != current.saved {
        writeln!(out, "{}", if current.saved { "(saved)" } else { "(unsaved)" })?;
    }
    if previous.templates != current.templates {
        writeln!(out, "templates: {}", current.templates.join(", "))?;
    }
    if previous.selected_template != current.selected_template {
        match &current.selected_template {
            Some(name) => writeln!(out, "template: {name}")?,
            None => writeln!(out, "template: none available")?,
        }
    }
    if previous.source != current.source {
        match &current.source {
            SourceExtract::Ready { source } => {
                writeln!(out, "---- source ----")?;
                writeln!(out, "{}", source.trim_end())?;
                writeln!(out, "----------------")?;
            }
            SourceExtract::Failed { reason } => writeln!(out, "source extract failed: {reason}")?,
            SourceExtract::Pending { .. } => writeln!(out, "fetching source...")?,
            SourceExtract::None => {}
        }
    }
    if previous.export != current.export {
        match &current.export {
            ExportStatus::Written { path } => writeln!(out, "exported to {path}")?,
            ExportStatus::Failed { reason } => writeln!(out, "export failed: {reason}")?,
            ExportStatus::Pending | ExportStatus::None => {}
        }
    }
    out.flush()
}

fn render_log_delta(out: &mut impl Write, previous: &str, current: &str) -> io::Result<()> {
    if current.is_empty() {
        return writeln!(out, "(log cleared)");
    }
    let appended = match current.strip_prefix(previous) {
        Some(rest) if !previous.is_empty() => rest.strip_prefix('\n').unwrap_or(rest),
        _ => current,
    };
    for line in appended.lines() {
        writeln!(out, "| {line}")?;
    }
    Ok(())
}

/// Full status dump for `:show`.
pub fn render_status(out: &mut impl Write, view: &AppViewModel, document: &str) -> io::Result<()> {
    writeln!(out, "==== document ====")?;
    write!(out, "{document}")?;
    if !document.is_empty() && !document.ends_with('\n') {
        writeln!(out)?;
    }
    writeln!(out, "==================")?;
    writeln!(out, "title:    {}", view.title.as_deref().unwrap_or("(none)"))?;
    writeln!(out, "saved:    {}", if view.saved { "yes" } else { "no" })?;
    writeln!(
        out,
        "template: {}",
        view.selected_template.as_deref().unwrap_or("(none)")
    )?;
    writeln!(out, "phase:    {}", phase_label(view.phase))?;
    if let Some(job_id) = &view.job_id {
        writeln!(out, "job:      {job_id}")?;
    }
    writeln!(
        out,
        "preview:  {}",
        view.artifact_ref.as_deref().unwrap_or("(none)")
    )?;
    for line in view.log.lines() {
        writeln!(out, "| {line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn printed(previous: &AppViewModel, current: &AppViewModel) -> String {
        let mut buf = Vec::new();
        render_changes(&mut buf, previous, current).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn only_new_log_lines_are_printed() {
        let previous = AppViewModel {
            phase: Phase::Compiling,
            log: "Sending request...".to_string(),
            ..AppViewModel::default()
        };
        let current = AppViewModel {
            phase: Phase::Succeeded,
            log: "Sending request...\nConversion successful.\nPDF compiled successfully."
                .to_string(),
            artifact_ref: Some("/x/1.pdf?t=5".to_string()),
            last_outcome: Some(OutcomeKind::NewArtifact),
            ..AppViewModel::default()
        };

        assert_eq!(
            printed(&previous, &current),
            "| Conversion successful.\n| PDF compiled successfully.\n[succeeded]\npreview: /x/1.pdf?t=5\n"
        );
    }

    #[test]
    fn new_job_reprints_log_and_degraded_success_is_called_out() {
        let previous = AppViewModel {
            phase: Phase::Failed,
            log: "Sending request...\nError: boom".to_string(),
            artifact_ref: Some("/x/1.pdf?t=5".to_string()),
            ..AppViewModel::default()
        };
        let current = AppViewModel {
            phase: Phase::Succeeded,
            log: "Sending request...\nConversion successful.".to_string(),
            artifact_ref: Some("/x/1.pdf?t=5".to_string()),
            last_outcome: Some(OutcomeKind::NoArtifact),
            ..AppViewModel::default()
        };

        assert_eq!(
            printed(&previous, &current),
            "| Sending request...\n| Conversion successful.\n[succeeded]\npreview unchanged: no new PDF\n"
        );
    }

    #[test]
    fn cleared_log_is_reported() {
        let previous = AppViewModel {
            log: "Sending request...".to_string(),
            ..AppViewModel::default()
        };
        assert_eq!(
            printed(&previous, &AppViewModel::default()),
            "(log cleared)\n"
        );
    }
}
