mod app;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use tracing::info;

use seedgraph::expansion::TemplateProvider;
use seedgraph::logging::init_tracing;
use seedgraph::{Explorer, ExplorerConfig, GraphData, Node, NodeType, SeedFile};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Seed file to open; Ctrl+S saves back to it.
    #[arg(long)]
    seed_file: Option<PathBuf>,

    /// JSON file overriding explorer and physics defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    width: Option<f32>,

    #[arg(long)]
    height: Option<f32>,
}

fn load_explorer(args: &Args) -> Result<Explorer> {
    let mut config = match &args.config {
        Some(path) => ExplorerConfig::from_path(path)?,
        None => ExplorerConfig::default(),
    };
    if let Some(width) = args.width {
        config.viewport_width = width;
    }
    if let Some(height) = args.height {
        config.viewport_height = height;
    }

    let mut explorer = match &args.seed_file {
        Some(path) if path.exists() => {
            let file = SeedFile::load_from_path(path)
                .with_context(|| format!("failed to open seed file {}", path.display()))?;
            Explorer::from_seed_file(file, config)
                .with_context(|| format!("seed file {} is inconsistent", path.display()))?
        }
        _ => {
            let root = GraphData {
                nodes: vec![Node::new(seedgraph::util::fresh_id(), "New idea", NodeType::Concept).as_root()],
                links: Vec::new(),
            };
            Explorer::with_root(config, root)
        }
    };
    explorer.set_provider(Arc::new(TemplateProvider));
    Ok(explorer)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let explorer = load_explorer(&args)?;
    let config = *explorer.config();
    info!(
        seed_file = ?args.seed_file,
        nodes = explorer.store().node_count(),
        "starting viewer"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([config.viewport_width + 620.0, config.viewport_height + 80.0]),
        ..Default::default()
    };

    let seed_path = args.seed_file.clone();
    eframe::run_native(
        "seedgraph",
        options,
        Box::new(move |cc| Ok(Box::new(app::SeedGraphApp::new(cc, explorer, seed_path)))),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
