use anyhow::Context;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use polyevo::fitness::Metric;
use polyevo::runner::Runner;
use polyevo::settings::{Mode, RunSettings};

#[derive(Parser, Debug)]
#[command(name = "polyevo")]
#[command(author, version, about = "Approximate an image with semi-transparent polygons")]
struct Args {
    /// target image
    target: PathBuf,

    /// JSON settings file; flags below override it
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// seed the population with a saved genome
    #[arg(long)]
    dna: Option<PathBuf>,

    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many cycles
    #[arg(short, long)]
    cycles: Option<u64>,

    /// stop after this many seconds
    #[arg(short, long)]
    duration: Option<f64>,

    #[arg(short, long)]
    polygons: Option<usize>,

    #[arg(short, long)]
    vertices: Option<usize>,

    #[arg(long)]
    population: Option<usize>,

    /// genetic | swarm
    #[arg(short, long)]
    mode: Option<Mode>,

    /// sad | ssd | mse | euclidean | color_dist | squared_color_dist | ssim
    #[arg(long)]
    metric: Option<Metric>,

    /// also write the best genome as SVG
    #[arg(long, default_value_t = false)]
    svg: bool,

    /// write the effective settings to this file and exit
    #[arg(long)]
    save_settings: Option<PathBuf>,
}

impl Args {
    fn apply(&self, s: &mut RunSettings) {
        if let Some(v) = &self.output {
            s.checkpoint.output_dir = v.clone();
        }
        if let Some(v) = self.seed {
            s.seed = v;
        }
        if let Some(v) = self.cycles {
            s.stop.max_cycles = Some(v);
        }
        if let Some(v) = self.duration {
            s.stop.max_duration_secs = Some(v);
        }
        if let Some(v) = self.polygons {
            s.polygon_count = v;
        }
        if let Some(v) = self.vertices {
            s.vertices_count = v;
        }
        if let Some(v) = self.population {
            s.population_size = v;
        }
        if let Some(v) = self.mode {
            s.mode = v;
        }
        if let Some(v) = self.metric {
            s.metric = v;
        }
        if self.svg {
            s.checkpoint.export_svg = true;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // worker threads get names like "rayon-0"
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => RunSettings::load(path).with_context(|| format!("loading settings {}", path.display()))?,
        None => RunSettings::default(),
    };
    args.apply(&mut settings);
    settings.validate().context("invalid settings")?;

    if let Some(path) = &args.save_settings {
        settings
            .save(path)
            .with_context(|| format!("writing settings {}", path.display()))?;
        info!("settings written to {}", path.display());
        return Ok(());
    }

    let target = image::open(&args.target)
        .with_context(|| format!("opening target {}", args.target.display()))?
        .to_rgb8();
    let dna = match &args.dna {
        Some(path) => Some(std::fs::read(path).with_context(|| format!("reading DNA {}", path.display()))?),
        None => None,
    };

    let mut runner = Runner::new(target, settings, dna.as_deref())?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)).context("installing Ctrl-C handler")?;
    }

    let summary = runner.run(&stop)?;
    info!(
        "done: {} cycles in {:.1}s, best fitness {:.2} ({:?})",
        summary.cycles,
        summary.elapsed.as_secs_f64(),
        summary.best_fitness,
        summary.reason
    );
    Ok(())
}
