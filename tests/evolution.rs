// end-to-end behaviour of the evolution pieces through the public API

use polyevo::analysis::ColorInit;
use polyevo::dna::{DnaShape, GenomeShape};
use polyevo::engine::{substitution, GenomeInit};
use polyevo::{
    CpuRenderer, Crossover, DnaError, Evaluator, Genome, Metric, MutateConfig, MutationKind, Polygon, Raster,
    RunSettings, Selection, Substitution,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::cmp::Ordering;
use std::sync::Arc;

fn triangle_on_white() -> Genome {
    Genome {
        width: 10,
        height: 10,
        vertices_count: 3,
        background: [255, 255, 255],
        polys: vec![Arc::new(Polygon::new(vec![(1, 1), (8, 2), (3, 8)], [0, 0, 0, 255]))],
    }
}

// float metrics sum rows in a different grouping than rectangles, so ties are
// compared with a tolerance relative to the frame total
fn direction(delta: f64, scale: f64) -> Ordering {
    if delta.abs() <= 1e-9 * scale.max(1.0) {
        Ordering::Equal
    } else if delta < 0.0 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[test]
fn partial_and_full_fitness_agree_on_improvement() {
    let metrics = [
        Metric::Sad,
        Metric::Ssd,
        Metric::Mse,
        Metric::Euclidean,
        Metric::ColorDist,
        Metric::SquaredColorDist,
    ];
    for antialias in [false, true] {
        for metric in metrics {
            let eval = Evaluator::new(Raster::solid(10, 10, [255, 255, 255]), metric, antialias);
            let cfg = MutateConfig::default();
            let mut rng = Pcg32::seed_from_u64(21);
            let parent = triangle_on_white();
            let parent_raster = eval.renderer.render(&parent);
            let parent_full = eval.fitness.full(&parent_raster);
            let pad = eval.renderer.bbox_pad();
            assert_eq!(pad, if antialias { 2 } else { 1 });

            for _ in 0..200 {
                let hard = rng.random_bool(0.5);
                let m = parent.mutant(&mut rng, &cfg, hard);
                let child_raster = eval.renderer.render(&m.genome);
                let full = eval.fitness.full(&child_raster) - parent_full;
                let partial = eval.fitness.partial(&child_raster, &m.before, &m.after, pad)
                    - eval.fitness.partial(&parent_raster, &m.before, &m.after, pad);
                assert_eq!(
                    direction(full, parent_full),
                    direction(partial, parent_full),
                    "{metric:?} aa={antialias} {:?}: full {full} partial {partial}",
                    m.kind
                );
            }
        }
    }
}

#[test]
fn rendering_is_deterministic() {
    let mut rng = Pcg32::seed_from_u64(5);
    let target = Raster::solid(32, 24, [30, 60, 90]);
    let shape = GenomeShape {
        width: 32,
        height: 24,
        polygon_count: 40,
        vertices_count: 5,
    };
    let genome = Genome::random(&mut rng, shape, [0, 0, 0], &target, ColorInit::Random, 100);
    for antialias in [false, true] {
        let r = CpuRenderer::new(antialias);
        assert_eq!(r.render(&genome), r.render(&genome.clone()));
    }
}

#[test]
fn dna_round_trip_and_shape_check() {
    let genome = triangle_on_white();
    let bytes = genome.to_dna().unwrap();
    let back = Genome::from_dna(&bytes, Some(&DnaShape::from(genome.shape()))).unwrap();
    assert_eq!(back, genome);

    let other = DnaShape {
        width: 10,
        height: 10,
        vertices_count: 4,
    };
    assert!(matches!(Genome::from_dna(&bytes, Some(&other)), Err(DnaError::Mismatch { .. })));
}

#[test]
fn crossover_children_are_built_from_parent_slots() {
    let mut rng = Pcg32::seed_from_u64(8);
    let target = Raster::solid(16, 16, [0, 0, 0]);
    let shape = GenomeShape {
        width: 16,
        height: 16,
        polygon_count: 12,
        vertices_count: 3,
    };
    let a = Genome::random(&mut rng, shape, [0, 0, 0], &target, ColorInit::Random, 100);
    let b = Genome::random(&mut rng, shape, [0, 0, 0], &target, ColorInit::Random, 100);
    for op in [Crossover::SinglePoint, Crossover::SinglePointStochastic, Crossover::Uniform] {
        let (x, y) = op.recombine(&mut rng, &a, &b);
        for i in 0..12 {
            // each slot position keeps one polygon from each parent
            let from_a = Arc::ptr_eq(&x.polys[i], &a.polys[i]) && Arc::ptr_eq(&y.polys[i], &b.polys[i]);
            let swapped = Arc::ptr_eq(&x.polys[i], &b.polys[i]) && Arc::ptr_eq(&y.polys[i], &a.polys[i]);
            assert!(from_a ^ swapped, "{op:?} slot {i}");
        }
        assert_eq!(x.shape(), a.shape());
    }
}

#[test]
fn colour_hill_climb_converges_on_a_flat_target() {
    let eval = Evaluator::new(Raster::solid(4, 4, [255, 0, 0]), Metric::Sad, false);
    // vertices live on the 0..=3 lattice, so no triangle covers the whole 4x4
    // canvas; the background already matches the target and scores 0
    let genome = Genome {
        width: 4,
        height: 4,
        vertices_count: 3,
        background: [255, 0, 0],
        polys: vec![Arc::new(Polygon::new(vec![(0, 0), (3, 0), (0, 3)], [0, 0, 255, 255]))],
    };
    let mut ind = eval.express(genome);
    let start = ind.fitness();
    assert!(start > 0.0);

    let cfg = MutateConfig::only(MutationKind::ColorPerturb);
    let mut rng = Pcg32::seed_from_u64(1);
    for _ in 0..20_000 {
        ind.cycle(&mut rng, &eval, &cfg, false, true);
    }
    assert_eq!(ind.fitness(), 0.0);
    assert_eq!(ind.genome().polys[0].rgba, [255, 0, 0, 255]);
}

#[test]
fn tournament_of_three_over_six() {
    let mut rng = Pcg32::seed_from_u64(3);
    let fitness = [6.0, 5.0, 4.0, 3.0, 2.0, 1.0];
    let groups = substitution::tournament_groups(&mut rng, 6, 6, 3);
    assert_eq!(groups.len(), 6);
    for g in &groups {
        assert_eq!(g.len(), 3);
        let w = substitution::group_winner(g, &fitness);
        assert!(g.iter().all(|&i| fitness[w] <= fitness[i]));
    }
}

#[test]
fn unknown_policy_names_fail_fast() {
    assert!("best_of".parse::<Selection>().is_err());
    assert!("two_point".parse::<Crossover>().is_err());
    assert!("elitist".parse::<Substitution>().is_err());
    assert!("psnr".parse::<Metric>().is_err());
    assert!(serde_json::from_str::<RunSettings>(r#"{ "crossover": "two_point" }"#).is_err());
}

#[test]
fn stochastic_acceptance_accepts_a_perfect_individual() {
    let mut rng = Pcg32::seed_from_u64(12);
    let pairs = Selection::StochasticAcceptance.select_pairs(&mut rng, &[0.0, 10.0, 20.0], 50);
    assert_eq!(pairs.len(), 50);
    assert!(pairs.iter().all(|&(a, b)| a < 3 && b < 3));
}

#[test]
fn genetic_run_improves_on_the_initial_population() {
    let mut target = Raster::solid(20, 20, [240, 240, 240]);
    for y in 5..15 {
        for x in 5..15 {
            let i = (y * 20 + x) * 4;
            target.data[i..i + 3].copy_from_slice(&[20, 20, 200]);
        }
    }
    let eval = Evaluator::new(target, Metric::Ssd, false);
    let init = GenomeInit {
        shape: GenomeShape {
            width: 20,
            height: 20,
            polygon_count: 6,
            vertices_count: 3,
        },
        background: [240, 240, 240],
        colors: ColorInit::VertexMid,
        initial_alpha: 150,
    };
    let mut rng = Pcg32::seed_from_u64(2);
    let mut pop = polyevo::Population::random(&mut rng, &eval, &init, 6, None).unwrap();
    let start = pop.best_ever().fitness();
    let settings = RunSettings {
        population_size: 6,
        ..RunSettings::default()
    };
    for _ in 0..300 {
        pop.iterate(&mut rng, &eval, &settings, false);
    }
    assert_eq!(
        pop.best_ever().fitness().partial_cmp(&start),
        Some(Ordering::Less),
        "no improvement after 300 iterations"
    );
}
