//! Command-line interface for the swimlane utility
//!
//! Generates BPMN 2.0 documents from JSON process descriptions and
//! validates, repairs, inspects and renders existing documents.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

use swimlane::core::logging::{init_logging, LOG_FORMAT_ENV, LOG_LEVEL_ENV};
use swimlane::plugins::bpmn::{repair, validate, PipelineLayout, ProcessInput};
use swimlane::plugins::Orchestrator;
use swimlane::viewer::{ViewerEvent, ViewerSession};
use swimlane::{Database, Decoded, RunToken};

/// Swimlane - Build, check and view BPMN 2.0 process diagrams
#[derive(Parser)]
#[command(name = "swimlane")]
#[command(about = "Generate, validate, repair, inspect and render BPMN 2.0 diagrams")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Set log level (trace|debug|info|warn|error)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, clap::ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a BPMN document from a JSON process description
    Generate {
        /// Input JSON file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output BPMN file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run token embedded in every id (defaults to the clock)
        #[arg(long)]
        run_token: Option<u64>,
    },

    /// Check a BPMN document's structure
    Validate {
        /// Input BPMN file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Fix non-fatal structural issues in a BPMN document
    Repair {
        /// Input BPMN file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output BPMN file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a BPMN document and summarize its contents
    Inspect {
        /// Input BPMN file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Render a BPMN document as SVG
    Render {
        /// Input BPMN file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output SVG file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Canvas width
        #[arg(long, default_value_t = 1200.0)]
        width: f64,

        /// Canvas height
        #[arg(long, default_value_t = 800.0)]
        height: f64,

        /// Zoom in this many steps after fitting
        #[arg(long, default_value_t = 0, conflicts_with = "zoom_out")]
        zoom_in: u32,

        /// Zoom out this many steps after fitting
        #[arg(long, default_value_t = 0)]
        zoom_out: u32,
    },

    /// Detect the document type of the input
    Detect {
        /// Input file to analyze (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Decoded document summary printed by `inspect`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub process_id: String,
    pub process_name: String,
    pub lanes: Vec<String>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Node count per BPMN element name
    pub kinds: BTreeMap<String, usize>,
    /// `[x, y, width, height]`
    pub bounding_box: Option<[f64; 4]>,
    pub warnings: Vec<String>,
}

/// Main CLI application
pub struct SwimlaneApp {
    orchestrator: Orchestrator,
}

impl SwimlaneApp {
    /// Create a new application instance with the BPMN plugins
    pub fn new() -> Self {
        Self {
            orchestrator: Orchestrator::with_bpmn_plugins(),
        }
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level_str = std::env::var(LOG_LEVEL_ENV)
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .or_else(|| Some(cli.log_level.as_str().to_string()));

        let log_format_str = std::env::var(LOG_FORMAT_ENV)
            .ok()
            .or_else(|| Some(cli.log_format.as_str().to_string()));

        if let Err(e) = init_logging(log_level_str.as_deref(), log_format_str.as_deref()) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Swimlane v{}", env!("CARGO_PKG_VERSION"));
        }

        match cli.command {
            Commands::Generate {
                input,
                output,
                run_token,
            } => self.generate_command(input, output, run_token, cli.verbose),
            Commands::Validate { input, json } => self.validate_command(input, json, cli.verbose),
            Commands::Repair { input, output } => self.repair_command(input, output, cli.verbose),
            Commands::Inspect { input, json } => self.inspect_command(input, json, cli.verbose),
            Commands::Render {
                input,
                output,
                width,
                height,
                zoom_in,
                zoom_out,
            } => self.render_command(input, output, width, height, zoom_in, zoom_out, cli.verbose),
            Commands::Detect { input } => self.detect_command(input, cli.verbose),
        }
    }

    /// Handle the generate command
    fn generate_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        run_token: Option<u64>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let process: ProcessInput = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Invalid process description: {}", e))?;

        let token = run_token.map(RunToken::from).unwrap_or_else(RunToken::now);
        debug!(%token, "Generating process");
        let generated = self.orchestrator.generate(&process, token)?;

        for warning in &generated.warnings {
            warn!(%warning, "Generation warning");
        }
        if verbose {
            eprintln!(
                "Generated {} nodes and {} flows (run token {}{})",
                generated.model.node_count(),
                generated.model.edge_count(),
                token,
                if generated.regenerated { ", regenerated" } else { "" }
            );
        }

        self.write_output(output, &generated.xml)
    }

    /// Handle the validate command
    ///
    /// Fails only on fatal issues; other issues are reported.
    fn validate_command(&self, input: Option<PathBuf>, json: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let report = validate(&content);
        if json {
            let result = serde_json::json!({
                "ok": report.ok(),
                "fatal": report.is_fatal(),
                "issues": report
                    .issues
                    .iter()
                    .map(|issue| serde_json::json!({
                        "message": issue.to_string(),
                        "fatal": issue.is_fatal(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else if report.ok() {
            println!("✓ Valid BPMN document");
        } else {
            for issue in &report.issues {
                let marker = if issue.is_fatal() { "✗" } else { "!" };
                println!("{} {}", marker, issue);
            }
        }

        if report.is_fatal() {
            return Err(anyhow!("Document has fatal issues: {}", report));
        }
        Ok(())
    }

    /// Handle the repair command
    fn repair_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let repaired = repair(&content);

        if verbose {
            for patch in &repaired.patches {
                eprintln!("Applied: {}", patch);
            }
        }

        if let Some(issue) = repaired.residual.iter().find(|issue| issue.is_fatal()) {
            return Err(anyhow!("Document cannot be repaired: {}", issue));
        }
        for issue in &repaired.residual {
            warn!(%issue, "Issue remains after repair");
        }

        self.write_output(output, &repaired.xml)
    }

    /// Decode a document into a [`Summary`]
    pub fn summarize(&self, content: &str) -> Result<Summary> {
        let (model, warnings) = match self.orchestrator.import(content) {
            Decoded::Diagram { model, warnings } => (model, warnings),
            Decoded::Unrecognized => return Err(anyhow!("Nothing recognizable as BPMN")),
        };

        let mut kinds = BTreeMap::new();
        for node in model.nodes() {
            *kinds.entry(node.kind.element_name().to_string()).or_insert(0) += 1;
        }
        let bounding_box = PipelineLayout::new()
            .route_existing(&model)
            .bounding_box
            .map(|b| [b.x, b.y, b.width, b.height]);

        Ok(Summary {
            process_id: model.process_id().to_string(),
            process_name: model.process_name().to_string(),
            lanes: model.lanes().iter().map(|lane| lane.name.clone()).collect(),
            node_count: model.node_count(),
            edge_count: model.edge_count(),
            kinds,
            bounding_box,
            warnings: warnings.iter().map(|w| w.to_string()).collect(),
        })
    }

    /// Handle the inspect command
    fn inspect_command(&self, input: Option<PathBuf>, json: bool, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        let summary = self.summarize(&content)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("Process: {} ({})", summary.process_name, summary.process_id);
        println!("Lanes:   {}", summary.lanes.join(", "));
        println!("Nodes:   {}", summary.node_count);
        for (kind, count) in &summary.kinds {
            println!("  {:<18} {}", kind, count);
        }
        println!("Flows:   {}", summary.edge_count);
        if let Some([x, y, width, height]) = summary.bounding_box {
            println!("Bounds:  {} {} {} {}", x, y, width, height);
        }
        for warning in &summary.warnings {
            println!("! {}", warning);
        }
        Ok(())
    }

    /// Render a document into an SVG string
    pub fn render_document(
        &self,
        content: &str,
        width: f64,
        height: f64,
        zoom_in: u32,
        zoom_out: u32,
    ) -> Result<String> {
        let mut session = ViewerSession::new(width, height);
        self.orchestrator.import_for_viewing(content, &mut session)?;
        for _ in 0..zoom_in {
            session.handle(ViewerEvent::ZoomIn);
        }
        for _ in 0..zoom_out {
            session.handle(ViewerEvent::ZoomOut);
        }
        debug!(scale = session.state().scale, "Rendering view");
        Ok(session.render_svg())
    }

    /// Handle the render command
    #[allow(clippy::too_many_arguments)]
    fn render_command(
        &self,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        width: f64,
        height: f64,
        zoom_in: u32,
        zoom_out: u32,
        verbose: bool,
    ) -> Result<()> {
        let content = self.read_input(input)?;
        let svg = self.render_document(&content, width, height, zoom_in, zoom_out)?;

        if verbose {
            eprintln!("Rendered {} bytes of SVG", svg.len());
        }

        self.write_output(output, &svg)
    }

    /// Handle the detect command
    fn detect_command(&self, input: Option<PathBuf>, verbose: bool) -> Result<()> {
        let content = self.read_input(input)?;

        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }

        match self.orchestrator.detect_diagram_type(&content) {
            Ok(diagram_type) => {
                println!("{}", diagram_type);
                Ok(())
            }
            Err(e) => {
                eprintln!("Could not detect diagram type: {}", e);
                Err(e)
            }
        }
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content).map_err(|e| {
                    anyhow!("Failed to write output file '{}': {}", path.display(), e)
                })?;
            }
            _ => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(content.as_bytes())?;
                if !content.is_empty() && !content.ends_with('\n') {
                    stdout.write_all(b"\n")?;
                }
                stdout.flush()?;
            }
        }
        Ok(())
    }

    /// Get a reference to the orchestrator (for testing)
    #[cfg(test)]
    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }
}

impl Default for SwimlaneApp {
    fn default() -> Self {
        Self::new()
    }
}
