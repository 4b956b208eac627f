//! Command-line interface definition and dispatch.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::artifact::DirectorySink;
use crate::capture::{CaptureOptions, CaptureOrchestrator, CaptureOutcome, LogUi};
use crate::config::Config;
use crate::dom::{parse_html, shared, DocumentHandle, MemoryDocument};
use crate::engine::{MarkupEngine, SrcdocFrameTree};
use crate::messaging::{ChannelController, InboundMessage, OutboundMessage};

#[derive(Parser, Debug)]
#[command(name = "pagesnap", version, about = "Save self-contained snapshots of HTML pages")]
pub struct Cli {
    /// Data directory for logs and config (default: $PAGESNAP_HOME or ~/.pagesnap)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture an HTML file into a single self-contained page.
    Capture(CaptureCmd),
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        match self.command {
            Commands::Capture(cmd) => cmd.run().await,
        }
    }
}

#[derive(Args, Debug)]
pub struct CaptureCmd {
    /// HTML file to capture
    pub input: PathBuf,

    /// Directory the page is saved to (default: from config, else current directory)
    #[arg(long, short)]
    pub output_dir: Option<PathBuf>,

    /// Capture only the contents of the element with this id (implies --selected)
    #[arg(long)]
    pub selected_id: Option<String>,

    /// Capture only the selected content
    #[arg(long)]
    pub selected: bool,

    #[arg(long)]
    pub remove_frames: bool,

    #[arg(long)]
    pub remove_hidden_elements: bool,

    #[arg(long)]
    pub remove_scripts: bool,

    /// Append the save date to the filename
    #[arg(long)]
    pub append_save_date: bool,

    /// Report capture start and end
    #[arg(long)]
    pub shadow: bool,

    /// Location reported for the document (default: file:// URL of the input)
    #[arg(long)]
    pub url: Option<String>,

    /// Config file to use instead of the one in the data directory
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl CaptureCmd {
    pub async fn run(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Config::load_from(path)?,
            None => Config::load(),
        };

        let html = tokio::fs::read_to_string(&self.input)
            .await
            .with_context(|| format!("Failed to read {}", self.input.display()))?;
        let location = match self.url.clone().or_else(|| config.location.clone()) {
            Some(location) => location,
            None => file_url(&self.input)?,
        };
        let mut document = parse_html(&html, &location)?;
        if let Some(id) = &self.selected_id {
            select_element(&mut document, id)?;
        }
        let options = self.options(config.capture.to_options());

        let output_dir = self.output_dir.clone().unwrap_or(config.output_dir);
        let sink = DirectorySink::new(output_dir);
        let document = shared(document);
        let (controller, mut rx) = ChannelController::channel();
        let orchestrator = Arc::new(
            CaptureOrchestrator::new(
                document.clone(),
                Arc::new(MarkupEngine::new()),
                Arc::new(controller),
                Arc::new(sink.clone()),
            )
            .with_frames(Arc::new(SrcdocFrameTree::new(document)))
            .with_ui(Arc::new(LogUi)),
        );

        let printer = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                report(&message);
            }
        });

        let dispatch = orchestrator.handle_message(InboundMessage::ProcessStart { options });
        let task = dispatch
            .task
            .context("Capture did not start")?;
        let result = task.await.context("Capture task panicked")?;

        // Closes the controller channel so the printer drains and exits
        drop(orchestrator);
        printer.await.context("Progress printer panicked")?;

        match result? {
            CaptureOutcome::Completed { filename } => {
                println!("{}", sink.path_for(&filename)?.display());
                Ok(())
            }
            CaptureOutcome::Busy => bail!("A capture is already running"),
        }
    }

    /// Combine config defaults with the flags; a flag can only turn an option on.
    fn options(&self, defaults: CaptureOptions) -> CaptureOptions {
        let selected = defaults.selected || self.selected || self.selected_id.is_some();
        let remove_frames = defaults.remove_frames || self.remove_frames;
        let remove_hidden = defaults.remove_hidden_elements || self.remove_hidden_elements;
        let remove_scripts = defaults.remove_scripts || self.remove_scripts;
        let shadow = defaults.shadow_enabled || self.shadow;
        let append_save_date = defaults.append_save_date || self.append_save_date;
        defaults
            .with_selected(selected)
            .with_remove_frames(remove_frames)
            .with_remove_hidden_elements(remove_hidden)
            .with_remove_scripts(remove_scripts)
            .with_shadow_enabled(shadow)
            .with_append_save_date(append_save_date)
    }
}

fn select_element(document: &mut MemoryDocument, id: &str) -> Result<()> {
    let Some(element) = document.element_by_id(id) else {
        bail!("No element with id {id:?}");
    };
    document.select_node_contents(element);
    Ok(())
}

fn file_url(path: &Path) -> Result<String> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(format!("file://{}", absolute.display()))
}

fn report(message: &OutboundMessage) {
    match message {
        OutboundMessage::ProcessProgress { index, max_index } => {
            eprintln!("progress {index}/{max_index}");
        }
        OutboundMessage::ProcessEnd => eprintln!("processing done"),
        OutboundMessage::ProcessError { error } => eprintln!("error: {error}"),
    }
}
