use image::{imageops, RgbImage};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::analysis;
use crate::dna::{DnaShape, Genome, GenomeShape};
use crate::engine::{FitnessStats, GenomeInit, Population};
use crate::error::{ConfigError, DnaError, Result};
use crate::export;
use crate::individual::{Evaluator, Individual};
use crate::render::Raster;
use crate::settings::{Mode, RunSettings};

/// why a run ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    MaxCycles,
    Duration,
    FitnessLimit,
    Unimproved,
    Interrupted,
}

/// progress sample taken every `log_every` cycles
#[derive(Clone, Copy, Debug)]
pub struct HistoryPoint {
    pub cycle: u64,
    pub best_ever: f64,
    pub stats: FitnessStats,
}

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub cycles: u64,
    pub best_fitness: f64,
    pub elapsed: Duration,
    pub reason: StopReason,
    pub history: Vec<HistoryPoint>,
    /// files written by the final export
    pub outputs: Vec<PathBuf>,
}

/// downsample so the longest side is at most `max_side` (aspect preserved)
pub fn fit_to(target: RgbImage, max_side: u32) -> RgbImage {
    let (w, h) = target.dimensions();
    let longest = w.max(h);
    if longest <= max_side {
        return target;
    }
    let factor = max_side as f64 / longest as f64;
    let nw = ((w as f64 * factor).round() as u32).max(1);
    let nh = ((h as f64 * factor).round() as u32).max(1);
    imageops::resize(&target, nw, nh, imageops::FilterType::Lanczos3)
}

/// drives a population: cycle loop, stopping conditions, checkpoints, final export
pub struct Runner {
    settings: RunSettings,
    eval: Evaluator,
    population: Population,
    rng: Pcg32,
    cycle: u64,
}

impl Runner {
    /// build the evaluator and the initial population. `seed_dna` (a saved
    /// genome) must match the run's dimensions, vertex and polygon counts.
    pub fn new(target: RgbImage, settings: RunSettings, seed_dna: Option<&[u8]>) -> Result<Self> {
        profiling::scope!("Runner::new");
        settings.validate()?;

        let target = fit_to(target, settings.max_internal_size);
        if target.width() == 0 || target.height() == 0 {
            return Err(ConfigError::Invalid(format!(
                "target image is empty ({}x{})",
                target.width(),
                target.height()
            ))
            .into());
        }
        let raster = Raster::from_rgb(target.width(), target.height(), target.as_raw());
        let background = settings
            .background
            .unwrap_or_else(|| analysis::average_color(&raster));
        let shape = GenomeShape {
            width: raster.width,
            height: raster.height,
            polygon_count: settings.polygon_count,
            vertices_count: settings.vertices_count,
        };

        let seed = match seed_dna {
            Some(bytes) => {
                let genome = Genome::from_dna(bytes, Some(&DnaShape::from(shape)))?;
                if genome.polys.len() != shape.polygon_count {
                    return Err(DnaError::Mismatch {
                        expected: format!("{} polygons", shape.polygon_count),
                        found: format!("{} polygons", genome.polys.len()),
                    }
                    .into());
                }
                Some(genome)
            }
            None => None,
        };

        let eval = Evaluator::new(raster, settings.metric, settings.antialias);
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let init = GenomeInit {
            shape,
            background,
            colors: settings.initial_colors,
            initial_alpha: settings.initial_alpha,
        };
        let population = Population::random(&mut rng, &eval, &init, settings.population_size, seed)?;

        Ok(Self {
            settings,
            eval,
            population,
            rng,
            cycle: 0,
        })
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.eval
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best(&self) -> &Individual {
        self.population.best_ever()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// one full cycle. returns true when best-ever improved.
    pub fn step(&mut self) -> bool {
        profiling::scope!("Runner::step");
        let hard = self
            .settings
            .hard_mutation
            .choose(&mut self.rng, self.population.best_ever().fitness());
        let improved = match self.settings.mode {
            Mode::Genetic => self.population.iterate(&mut self.rng, &self.eval, &self.settings, hard),
            Mode::Swarm => self.population.swarm_cycle(&mut self.rng, &self.eval, &self.settings, hard),
        };
        self.cycle += 1;
        improved
    }

    fn stop_reason(&self, started: Instant, unimproved: u64, stop: &AtomicBool) -> Option<StopReason> {
        let s = &self.settings.stop;
        if s.max_cycles.is_some_and(|m| self.cycle >= m) {
            return Some(StopReason::MaxCycles);
        }
        if s.max_duration_secs.is_some_and(|d| started.elapsed().as_secs_f64() >= d) {
            return Some(StopReason::Duration);
        }
        if s.fitness_limit.is_some_and(|f| self.best().fitness() <= f) {
            return Some(StopReason::FitnessLimit);
        }
        if s.max_unimproved_cycles.is_some_and(|m| unimproved >= m) {
            return Some(StopReason::Unimproved);
        }
        if stop.load(Ordering::Relaxed) {
            return Some(StopReason::Interrupted);
        }
        None
    }

    /// cycle until a stopping condition holds or `stop` is raised, then export.
    /// conditions are checked once per completed cycle; the final export runs
    /// on every exit path.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<RunSummary> {
        let started = Instant::now();
        let log_every = self.settings.log_every;
        info!(
            "evolving {}x{} with {} polygons of {} vertices, population {} ({:?}, {:?})",
            self.eval.fitness.target().width,
            self.eval.fitness.target().height,
            self.settings.polygon_count,
            self.settings.vertices_count,
            self.settings.population_size,
            self.settings.mode,
            self.settings.metric,
        );
        if self.settings.stop.is_unbounded() {
            warn!("no stopping condition set, running until interrupted");
        }

        let mut history = Vec::new();
        let mut unimproved = 0u64;
        let mut last_log = Instant::now();
        let reason = loop {
            if self.step() {
                unimproved = 0;
            } else {
                unimproved += 1;
            }

            if log_every > 0 && self.cycle % log_every == 0 {
                let best = self.best().fitness();
                info!("[{}] fitness={:.2}, Δt={:.3}s", self.cycle, best, last_log.elapsed().as_secs_f64());
                last_log = Instant::now();
                history.push(HistoryPoint {
                    cycle: self.cycle,
                    best_ever: best,
                    stats: self.population.stats(),
                });
            }
            self.checkpoint();

            if let Some(reason) = self.stop_reason(started, unimproved, stop) {
                break reason;
            }
        };

        info!(
            "stopped after {} cycles ({:?}), best fitness {:.2}",
            self.cycle,
            reason,
            self.best().fitness()
        );
        let outputs = self.finalize()?;
        Ok(RunSummary {
            cycles: self.cycle,
            best_fitness: self.best().fitness(),
            elapsed: started.elapsed(),
            reason,
            history,
            outputs,
        })
    }

    // periodic outputs are best effort: a failed write is logged and the run goes on
    fn checkpoint(&self) {
        let cp = &self.settings.checkpoint;
        if cp.save_best_every > 0 && self.cycle % cp.save_best_every == 0 {
            let path = cp.output_dir.join(format!("{}{}.png", cp.best_prefix, self.cycle));
            match self.write_best(&path, 1.0) {
                Ok(()) => debug!("saved {}", path.display()),
                Err(e) => warn!("checkpoint {} failed: {e}", path.display()),
            }
        }
        if cp.save_all_every > 0 && self.cycle % cp.save_all_every == 0 {
            let path = cp.output_dir.join(format!("{}{}.png", cp.all_prefix, self.cycle));
            match self.write_all(&path) {
                Ok(()) => debug!("saved {}", path.display()),
                Err(e) => warn!("checkpoint {} failed: {e}", path.display()),
            }
        }
    }

    fn write_best(&self, path: &std::path::Path, scale: f32) -> Result<()> {
        std::fs::create_dir_all(&self.settings.checkpoint.output_dir).map_err(crate::error::ExportError::from)?;
        let raster = self.eval.renderer.render_scaled(self.best().genome(), scale);
        export::save_raster(&raster, path)?;
        Ok(())
    }

    fn write_all(&self, path: &std::path::Path) -> Result<()> {
        std::fs::create_dir_all(&self.settings.checkpoint.output_dir).map_err(crate::error::ExportError::from)?;
        let rasters: Vec<&Raster> = self.population.individuals().iter().map(Individual::raster).collect();
        export::save_mosaic(&rasters, path)?;
        Ok(())
    }

    /// final export: best raster (at `export_scale`), population mosaic, SVG and DNA
    pub fn finalize(&self) -> Result<Vec<PathBuf>> {
        profiling::scope!("Runner::finalize");
        let cp = &self.settings.checkpoint;
        let mut outputs = Vec::new();

        let best_png = cp.output_dir.join(format!("{}final.png", cp.best_prefix));
        self.write_best(&best_png, cp.export_scale)?;
        outputs.push(best_png);

        if self.population.len() > 1 {
            let all_png = cp.output_dir.join(format!("{}final.png", cp.all_prefix));
            self.write_all(&all_png)?;
            outputs.push(all_png);
        }

        if cp.export_svg {
            let svg = cp.output_dir.join(format!("{}final.svg", cp.best_prefix));
            export::save_svg(self.best().genome(), cp.export_scale, &svg)?;
            outputs.push(svg);
        }

        if cp.save_dna {
            let best = self.best().fitness();
            match cp.dna_min_fitness {
                Some(limit) if best >= limit => {
                    warn!("DNA not saved: best fitness {best:.2} is not below {limit:.2}");
                }
                _ => {
                    let path = cp.output_dir.join(format!("{}final.dna", cp.dna_prefix));
                    let bytes = self.best().genome().to_dna()?;
                    std::fs::write(&path, bytes).map_err(DnaError::from)?;
                    outputs.push(path);
                }
            }
        }

        for path in &outputs {
            info!("wrote {}", path.display());
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn large_targets_are_downsampled() {
        let img = RgbImage::from_pixel(1000, 500, Rgb([1, 2, 3]));
        let small = fit_to(img, 200);
        assert_eq!(small.dimensions(), (200, 100));
        let img = RgbImage::from_pixel(30, 20, Rgb([1, 2, 3]));
        assert_eq!(fit_to(img, 200).dimensions(), (30, 20));
    }

    #[test]
    fn background_defaults_to_average_colour() {
        let settings = RunSettings {
            polygon_count: 4,
            population_size: 2,
            ..RunSettings::default()
        };
        let runner = Runner::new(RgbImage::from_pixel(8, 8, Rgb([10, 20, 30])), settings, None).unwrap();
        assert_eq!(runner.best().genome().background, [10, 20, 30]);
    }

    #[test]
    fn empty_target_is_a_config_error() {
        for (w, h) in [(0, 0), (0, 5), (7, 0)] {
            let r = Runner::new(RgbImage::new(w, h), RunSettings::default(), None);
            assert!(matches!(r, Err(crate::Error::Config(ConfigError::Invalid(_)))), "{w}x{h}");
        }
    }

    #[test]
    fn invalid_settings_fail_before_work() {
        let settings = RunSettings {
            vertices_count: 1,
            ..RunSettings::default()
        };
        assert!(Runner::new(RgbImage::new(4, 4), settings, None).is_err());
    }

    #[test]
    fn raised_stop_flag_ends_after_one_cycle() {
        let dir = std::env::temp_dir().join(format!("polyevo-runner-{}", std::process::id()));
        let mut settings = RunSettings {
            polygon_count: 3,
            population_size: 2,
            log_every: 0,
            ..RunSettings::default()
        };
        settings.checkpoint.output_dir = dir.clone();
        let mut runner = Runner::new(RgbImage::from_pixel(6, 6, Rgb([200, 0, 0])), settings, None).unwrap();
        let summary = runner.run(&AtomicBool::new(true)).unwrap();
        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.reason, StopReason::Interrupted);
        // interruption still goes through the final export
        assert!(summary.outputs.iter().all(|p| p.exists()));
        assert!(summary.outputs.iter().any(|p| p.extension().is_some_and(|e| e == "dna")));
        let _ = std::fs::remove_dir_all(dir);
    }
}
