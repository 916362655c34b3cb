//! Decisions must not depend on batching, staging partitions or threading.

use peaksieve::{
    Calibration, CandidateList, ChargeMap, Decisions, GridExtent, GridPosition,
    NeighborhoodGeometry, NoiseSuppressor, PeakStatusMap, SuppressionConfig,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

struct RandomScene {
    charge: ChargeMap,
    status: PeakStatusMap,
    candidates: CandidateList,
}

fn random_scene(seed: u64) -> RandomScene {
    let geometry = NeighborhoodGeometry::default();
    let (rows, pads, times) = (3, 24, 40);
    let extent = GridExtent::for_geometry(rows, pads, times, geometry).unwrap();
    let mut charge = ChargeMap::new(extent).unwrap();
    let mut status = PeakStatusMap::new(extent).unwrap();
    let mut rng = StdRng::seed_from_u64(seed);

    for row in 0..rows as u16 {
        for pad in 0..pads as u16 {
            for time in 0..times as u16 {
                let q = rng.random_range(4.0f32..200.0);
                charge.set_charge(GridPosition::new(row, pad, time), q);
            }
        }
    }

    let mut positions = Vec::new();
    for row in 0..rows as u16 {
        for pad in 0..pads as u16 {
            for time in 0..times as u16 {
                if rng.random_bool(0.15) {
                    let pos = GridPosition::new(row, pad, time);
                    status.mark_candidate(pos);
                    positions.push(pos);
                }
            }
        }
    }

    RandomScene {
        charge,
        status,
        candidates: CandidateList::new(positions, 4096).unwrap(),
    }
}

fn decide(
    scene: &RandomScene,
    batch_size: usize,
    slots_per_lane: usize,
    parallel: bool,
) -> Decisions {
    let suppressor = NoiseSuppressor::new(
        NeighborhoodGeometry::default(),
        SuppressionConfig {
            capacity: 4096,
            batch_size,
            slots_per_lane,
            parallel,
            verify_candidates: true,
        },
        Calibration {
            noise_epsilon: 8.0,
            ..Calibration::default()
        },
    )
    .unwrap();
    suppressor
        .evaluate(&scene.charge, &scene.status, &scene.candidates)
        .unwrap()
}

#[test]
fn partitioning_does_not_change_decisions() {
    let scene = random_scene(7);
    let reference = decide(&scene, 64, 16, false);
    assert_eq!(reference.decided(), scene.candidates.len());
    assert!(reference.kept() > 0);
    assert!(reference.kept() < scene.candidates.len());

    for (batch_size, slots) in [(1, 34), (5, 7), (13, 16), (64, 2), (1000, 1)] {
        assert_eq!(
            decide(&scene, batch_size, slots, false),
            reference,
            "batch={batch_size} slots={slots}"
        );
    }
}

#[test]
fn repeated_runs_are_identical() {
    for seed in [1, 2, 3] {
        let scene = random_scene(seed);
        assert_eq!(decide(&scene, 64, 16, false), decide(&scene, 64, 16, false));
    }
}

#[test]
fn parallel_flag_matches_sequential() {
    let scene = random_scene(11);
    let seq = decide(&scene, 32, 16, false);
    let par = decide(&scene, 32, 16, true);
    assert_eq!(seq, par);
}

#[cfg(feature = "rayon")]
#[test]
fn rayon_run_matches_sequential_status() {
    let scene = random_scene(23);
    let run = |parallel: bool| {
        let mut status = scene.status.clone();
        let suppressor = NoiseSuppressor::new(
            NeighborhoodGeometry::default(),
            SuppressionConfig {
                capacity: 4096,
                batch_size: 16,
                parallel,
                ..SuppressionConfig::default()
            },
            Calibration::default(),
        )
        .unwrap();
        let report = suppressor
            .run(&scene.charge, &mut status, &scene.candidates)
            .unwrap();
        (report, status)
    };

    let (seq_report, seq_status) = run(false);
    let (par_report, par_status) = run(true);
    assert_eq!(seq_report, par_report);
    assert_eq!(seq_status, par_status);
}
