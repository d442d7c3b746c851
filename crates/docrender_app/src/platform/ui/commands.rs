use std::path::PathBuf;

/// One line typed into the terminal editing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Plain text: appended to the buffer as a new line.
    Append(String),
    Render,
    Source,
    Templates,
    UseTemplate(String),
    ClearLog,
    Export,
    Show,
    Load(PathBuf),
    /// Replace the buffer with the example document.
    Reset,
    /// Drop the last line of the buffer.
    Pop,
    Help,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
Type text to append it to the document. Commands:
  :render            compile the document to PDF
  :source            fetch the intermediate source for inspection
  :templates         list templates
  :template NAME     select a template
  :clear-log         clear the log
  :export            save the current PDF into the output directory
  :show              print the document and session status
  :load PATH         replace the document with a file's content
  :pop               delete the last line
  :reset             replace the document with the example
  :help              this text
  :quit              save and exit
Start a line with '::' to append a line beginning with ':'.";

pub fn parse_line(line: &str) -> UiCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix("::") {
        return UiCommand::Append(format!(":{rest}"));
    }
    let Some(command) = line.strip_prefix(':') else {
        return UiCommand::Append(line.to_string());
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim(), ""),
    };
    match (name, arg) {
        ("render" | "r", "") => UiCommand::Render,
        ("source", "") => UiCommand::Source,
        ("templates", "") => UiCommand::Templates,
        ("template", name) if !name.is_empty() => UiCommand::UseTemplate(name.to_string()),
        ("clear-log", "") => UiCommand::ClearLog,
        ("export", "") => UiCommand::Export,
        ("show", "") => UiCommand::Show,
        ("load", path) if !path.is_empty() => UiCommand::Load(PathBuf::from(path)),
        ("reset", "") => UiCommand::Reset,
        ("pop", "") => UiCommand::Pop,
        ("help" | "h", "") => UiCommand::Help,
        ("quit" | "q", "") => UiCommand::Quit,
        _ => UiCommand::Unknown(line.to_string()),
    }
}

/// Buffer with its last line removed.
pub fn without_last_line(text: &str) -> String {
    let body = text.strip_suffix('\n').unwrap_or(text);
    match body.rfind('\n') {
        Some(idx) => body[..=idx].to_string(),
        None => String::new(),
    }
}
