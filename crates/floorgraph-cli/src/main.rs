use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use floorgraph_app::{EditorSession, EditorSettings, ExtractionResult};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and convert multi-floor building graphs", long_about = None)]
struct Cli {
    /// Editor settings file (JSON)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List each floor's layer: the nodes and edges drawn with it
    Layers {
        /// Saved document
        document: PathBuf,
    },
    /// Print the projected 3D overview as JSON
    Scene {
        document: PathBuf,
        #[arg(long)]
        angle: Option<f64>,
        #[arg(long)]
        tilt: Option<f64>,
        #[arg(long)]
        zoom: Option<f64>,
        #[arg(long)]
        separation: Option<f64>,
    },
    /// Write node and edge tables as CSV
    ExportCsv {
        document: PathBuf,
        #[arg(long)]
        nodes: PathBuf,
        #[arg(long)]
        edges: PathBuf,
    },
    /// Merge a saved extraction result onto one floor
    Merge {
        document: PathBuf,
        extraction: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        floor_level: i32,
        /// Where to write the merged document (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

fn open(settings: EditorSettings, document: &Path) -> Result<EditorSession> {
    let mut session = EditorSession::new(settings);
    session
        .load(document)
        .with_context(|| format!("Failed to open {}", document.display()))?;
    Ok(session)
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    tracing::debug!(?cli, "parsed arguments");
    let settings = EditorSettings::load_or_default(cli.settings.as_deref())?;

    match cli.command {
        Command::Layers { document } => {
            let session = open(settings, &document)?;
            for layer in session.layers() {
                let name = session
                    .document()
                    .floor(&layer.floor_id)
                    .map(|f| f.name.as_str())
                    .unwrap_or_default();
                writeln!(
                    out,
                    "level {} ({}): {} nodes, {} edges",
                    layer.level,
                    name,
                    layer.nodes.len(),
                    layer.edges.len()
                )?;
                for id in &layer.nodes {
                    writeln!(out, "  node {id}")?;
                }
                for id in &layer.edges {
                    writeln!(out, "  edge {id}")?;
                }
            }
        }
        Command::Scene {
            document,
            angle,
            tilt,
            zoom,
            separation,
        } => {
            let mut session = open(settings, &document)?;
            let camera = session.camera_mut();
            if let Some(angle) = angle {
                camera.set_angle(angle);
            }
            if let Some(tilt) = tilt {
                camera.set_tilt(tilt);
            }
            if let Some(zoom) = zoom {
                camera.set_zoom(zoom);
            }
            if let Some(separation) = separation {
                camera.set_separation(separation);
            }
            writeln!(out, "{}", serde_json::to_string_pretty(&session.scene())?)?;
        }
        Command::ExportCsv {
            document,
            nodes,
            edges,
        } => {
            let session = open(settings, &document)?;
            session.export_csv(&nodes, &edges)?;
            writeln!(
                out,
                "Wrote {} nodes to {} and {} edges to {}",
                session.document().nodes().len(),
                nodes.display(),
                session.document().edges().len(),
                edges.display()
            )?;
        }
        Command::Merge {
            document,
            extraction,
            floor_level,
            output,
        } => {
            let mut session = open(settings, &document)?;
            let content = std::fs::read_to_string(&extraction)
                .with_context(|| format!("Failed to read {}", extraction.display()))?;
            let result: ExtractionResult = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", extraction.display()))?;
            let report = session.merge_extraction(floor_level, &result)?;
            session.save(output.as_deref().unwrap_or(document.as_path()))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        }
    }

    Ok(())
}
