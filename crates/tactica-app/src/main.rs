//! `tactica` command-line entry point.

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tactica_app::{AppConfig, AppError, AppResult, ImportOptions, Session, ShortcutRegistry};
use tactica_core::{Orientation, StaticRoster};

#[derive(Parser, Debug)]
#[command(name = "tactica", version, about = "Tactics board diagrams from the command line")]
struct Cli {
    /// Config file (JSON). Defaults to the platform config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding saved diagrams.
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Owner whose diagrams are listed and saved.
    #[arg(long, global = true)]
    owner: Option<String>,

    /// Board layout to open diagrams in.
    #[arg(long, global = true, value_enum)]
    orientation: Option<Layout>,

    /// Export resolution multiplier (1-4).
    #[arg(long, global = true)]
    scale: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    Horizontal,
    Vertical,
}

impl From<Layout> for Orientation {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Horizontal => Orientation::Horizontal,
            Layout::Vertical => Orientation::Vertical,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved diagrams, newest first.
    List,
    /// Show one diagram's details.
    Show { diagram: String },
    /// Render a diagram to PNG.
    ExportPng {
        diagram: String,
        /// Output file or directory.
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also store the image as the diagram's preview.
        #[arg(long)]
        preview: bool,
    },
    /// Write a diagram as a portable board document.
    ExportJson {
        diagram: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Save a portable board document as a new diagram.
    Import {
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        team: Option<String>,
        /// Replace a diagram with the same name.
        #[arg(long)]
        overwrite: bool,
    },
    /// Delete a diagram.
    Delete { diagram: String },
    /// Print a diagram.
    Print { diagram: String },
    /// Show the placement palette for a roster file.
    Palette {
        /// Roster JSON (array of players).
        roster: PathBuf,
        /// Diagram whose players count as placed.
        diagram: Option<String>,
    },
    /// List keyboard shortcuts.
    Shortcuts,
}

fn configure(cli: &Cli) -> AppResult<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(storage) = &cli.storage {
        config.storage_dir = Some(storage.clone());
    }
    if let Some(owner) = &cli.owner {
        config.owner_id = owner.clone();
    }
    if let Some(layout) = cli.orientation {
        config.orientation = layout.into();
    }
    if let Some(scale) = cli.scale {
        config.export.scale = scale;
    }
    Ok(config)
}

async fn run(cli: Cli) -> AppResult<()> {
    if let Command::Shortcuts = cli.command {
        print!("{}", ShortcutRegistry::render());
        return Ok(());
    }

    let session = Session::open_files(configure(&cli)?)?;
    match cli.command {
        Command::List => {
            let diagrams = session.list().await?;
            if diagrams.is_empty() {
                println!("No saved diagrams.");
            }
            for d in diagrams {
                println!("{}  {:<40} {}", d.id, d.name, d.updated_at.format("%Y-%m-%d %H:%M"));
            }
        }
        Command::Show { diagram } => println!("{}", session.show(&diagram).await?),
        Command::ExportPng { diagram, out, preview } => {
            let path = session.export_png(&diagram, out.as_deref(), preview).await?;
            println!("Wrote {}", path.display());
        }
        Command::ExportJson { diagram, out } => {
            let path = session.export_document(&diagram, out.as_deref()).await?;
            println!("Wrote {}", path.display());
        }
        Command::Import {
            file,
            name,
            team,
            overwrite,
        } => {
            let options = ImportOptions {
                name,
                team_ref: team,
                overwrite,
            };
            let diagram = session.import(&file, &options).await?;
            println!("Saved \"{}\" ({})", diagram.name, diagram.id);
        }
        Command::Delete { diagram } => {
            let id = session.delete(&diagram).await?;
            println!("Deleted {}", id);
        }
        Command::Print { diagram } => {
            let spool = session.print(&diagram).await?;
            println!("Sent to printer spool {}", spool.display());
        }
        Command::Palette { roster: file, diagram } => {
            let roster: StaticRoster = serde_json::from_str(&fs::read_to_string(&file)?)
                .map_err(|e| AppError::Config(format!("{}: {}", file.display(), e)))?;
            for entry in session.palette(diagram.as_deref(), &roster).await? {
                let marker = if entry.disabled { " (on board)" } else { "" };
                println!("  {}{}", entry.label, marker);
            }
        }
        Command::Shortcuts => {}
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();
    log::debug!("Starting Tactica");

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
