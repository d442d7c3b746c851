use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::logging::LogDestination;

/// Command-line arguments for the docrender binary.
#[derive(Debug, Parser)]
#[command(
    name = "docrender",
    version,
    about = "Edit a document and render it to PDF through a compile service"
)]
pub struct Cli {
    /// Optional path to a RON configuration file.
    #[arg(long = "config", env = "DOCRENDER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the compile service.
    #[arg(long, env = "DOCRENDER_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    /// Give up on a render locally after this many seconds.
    #[arg(long, value_name = "SECS")]
    pub render_deadline: Option<u64>,

    /// Where log output goes.
    #[arg(long, value_enum)]
    pub log: Option<LogDestination>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Interactive editing session (the default).
    Session,
    /// Render a file once, print the log and exit non-zero on failure.
    Render {
        path: PathBuf,
        /// Template to use instead of the backend default.
        #[arg(long)]
        template: Option<String>,
    },
    /// List the templates offered by the compile service.
    Templates,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_subcommand_parses_template() {
        let cli = Cli::try_parse_from([
            "docrender",
            "--base-url",
            "http://render.local",
            "render",
            "notes.md",
            "--template",
            "report",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://render.local"));
        match cli.command {
            Some(Command::Render { path, template }) => {
                assert_eq!(path, PathBuf::from("notes.md"));
                assert_eq!(template.as_deref(), Some("report"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
