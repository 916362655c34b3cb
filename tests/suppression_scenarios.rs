use peaksieve::{
    Calibration, CandidateList, ChargeMap, GridExtent, GridPosition, NeighborhoodGeometry,
    NoiseSuppressor, PeakSieveError, PeakStatus, PeakStatusMap, SuppressionConfig,
};

const PIVOT: GridPosition = GridPosition::new(0, 5, 7);

struct Scene {
    charge: ChargeMap,
    status: PeakStatusMap,
}

impl Scene {
    fn new() -> Self {
        let extent =
            GridExtent::for_geometry(1, 12, 20, NeighborhoodGeometry::default()).unwrap();
        Self {
            charge: ChargeMap::new(extent).unwrap(),
            status: PeakStatusMap::new(extent).unwrap(),
        }
    }

    fn at(&self, dpad: i32, dtime: i32) -> GridPosition {
        GridPosition::new(
            0,
            (PIVOT.pad as i32 + dpad) as u16,
            (PIVOT.time as i32 + dtime) as u16,
        )
    }

    fn charge(&mut self, pos: GridPosition, q: f32) -> &mut Self {
        assert!(self.charge.set_charge(pos, q));
        self
    }

    fn peak(&mut self, pos: GridPosition, q: f32) -> &mut Self {
        self.charge(pos, q);
        assert!(self.status.mark_candidate(pos));
        self
    }
}

fn suppressor(epsilon: f32, batch_size: usize) -> NoiseSuppressor {
    NoiseSuppressor::new(
        NeighborhoodGeometry::default(),
        SuppressionConfig {
            capacity: 1024,
            batch_size,
            ..SuppressionConfig::default()
        },
        Calibration {
            noise_epsilon: epsilon,
            ..Calibration::default()
        },
    )
    .unwrap()
}

fn run_pivot_only(scene: &mut Scene, epsilon: f32) -> bool {
    let list = CandidateList::new(vec![PIVOT], 1024).unwrap();
    let report = suppressor(epsilon, 64)
        .run(&scene.charge, &mut scene.status, &list)
        .unwrap();
    report.decisions.get(0).unwrap()
}

#[test]
fn separated_by_clear_minimum_is_kept() {
    let mut scene = Scene::new();
    let (neighbor, between) = (scene.at(0, 2), scene.at(0, 1));
    scene.peak(PIVOT, 100.0).peak(neighbor, 110.0).charge(between, 40.0);

    assert!(run_pivot_only(&mut scene, 5.0));
    assert_eq!(scene.status.get(PIVOT), Some(PeakStatus::resolved(true)));
}

#[test]
fn shallow_dip_is_suppressed() {
    let mut scene = Scene::new();
    let (neighbor, between) = (scene.at(0, 2), scene.at(0, 1));
    scene.peak(PIVOT, 100.0).peak(neighbor, 110.0).charge(between, 98.0);

    assert!(!run_pivot_only(&mut scene, 5.0));
    assert_eq!(scene.status.get(PIVOT), Some(PeakStatus::resolved(false)));
    // The neighbor is not a listed candidate and keeps its status.
    assert_eq!(scene.status.get(neighbor), Some(PeakStatus::RAW_CANDIDATE));
}

#[test]
fn no_stronger_peak_means_kept() {
    let mut scene = Scene::new();
    let (weaker, plain) = (scene.at(-2, 3), scene.at(1, -1));
    scene.peak(PIVOT, 100.0).peak(weaker, 60.0).charge(plain, 150.0);

    assert!(run_pivot_only(&mut scene, 5.0));
}

#[test]
fn suppressed_neighbor_does_not_compete() {
    let mut scene = Scene::new();
    let neighbor = scene.at(0, 2);
    scene.peak(PIVOT, 100.0).charge(neighbor, 110.0);
    scene.status.set(neighbor, PeakStatus::resolved(false));
    scene.charge(scene.at(0, 1), 99.0);

    assert!(run_pivot_only(&mut scene, 5.0));
}

#[test]
fn adjacent_stronger_peak_always_suppresses() {
    let mut scene = Scene::new();
    let neighbor = scene.at(1, 1);
    scene.peak(PIVOT, 100.0).peak(neighbor, 101.0);

    assert!(!run_pivot_only(&mut scene, 0.0));
}

#[test]
fn equal_charge_peak_never_suppresses() {
    let mut scene = Scene::new();
    let (neighbor, between) = (scene.at(0, 2), scene.at(0, 1));
    scene.peak(PIVOT, 100.0).peak(neighbor, 100.0).charge(between, 99.5);

    assert!(run_pivot_only(&mut scene, 5.0));
}

#[test]
fn equal_charge_cell_is_not_a_minimum() {
    let mut scene = Scene::new();
    let (neighbor, between) = (scene.at(0, 2), scene.at(0, 1));
    scene.peak(PIVOT, 100.0).peak(neighbor, 110.0).charge(between, 100.0);

    assert!(!run_pivot_only(&mut scene, 0.0));
}

#[test]
fn every_competitor_needs_its_own_minimum() {
    let mut scene = Scene::new();
    let (left, right) = (scene.at(0, -2), scene.at(0, 2));
    let (left_gap, right_gap) = (scene.at(0, -1), scene.at(0, 1));
    scene
        .peak(PIVOT, 100.0)
        .peak(left, 120.0)
        .peak(right, 130.0)
        .charge(left_gap, 20.0)
        .charge(right_gap, 97.0);

    assert!(!run_pivot_only(&mut scene, 5.0));
}

#[test]
fn diagonal_competitor_uses_line_minima() {
    let mut scene = Scene::new();
    let neighbor = scene.at(-2, -3);
    scene.peak(PIVOT, 100.0).peak(neighbor, 140.0);
    // Cells on the line towards (-2, -3) are (-1, -1) and (-1, -2).
    for (dp, dt) in [(-1, -1), (-1, -2), (0, -1)] {
        scene.charge(scene.at(dp, dt), 99.0);
    }
    scene.charge(scene.at(-1, -2), 30.0);
    assert!(run_pivot_only(&mut scene, 5.0));
}

#[test]
fn decisions_use_pre_commit_snapshot() {
    // A (100) -- 98 -- B (110) -- 105 -- C (120), along the time axis.
    let build = || {
        let mut scene = Scene::new();
        let (a, b, c) = (scene.at(0, -2), scene.at(0, 0), scene.at(0, 2));
        let (ab_gap, bc_gap) = (scene.at(0, -1), scene.at(0, 1));
        scene
            .peak(a, 100.0)
            .charge(ab_gap, 98.0)
            .peak(b, 110.0)
            .charge(bc_gap, 105.0)
            .peak(c, 120.0);
        (scene, [a, b, c])
    };

    for order in [[0usize, 1, 2], [2, 1, 0], [1, 2, 0]] {
        let (mut scene, abc) = build();
        let positions: Vec<_> = order.iter().map(|&i| abc[i]).collect();
        let list = CandidateList::new(positions, 1024).unwrap();
        suppressor(5.0, 1)
            .run(&scene.charge, &mut scene.status, &list)
            .unwrap();

        assert_eq!(scene.status.get(abc[0]), Some(PeakStatus::resolved(false)));
        assert_eq!(scene.status.get(abc[1]), Some(PeakStatus::resolved(false)));
        assert_eq!(scene.status.get(abc[2]), Some(PeakStatus::resolved(true)));
    }
}

#[test]
fn empty_candidate_list_writes_nothing() {
    let mut scene = Scene::new();
    scene.peak(PIVOT, 100.0);
    let before = scene.status.clone();

    let list = CandidateList::new(Vec::new(), 1024).unwrap();
    let report = suppressor(5.0, 64)
        .run(&scene.charge, &mut scene.status, &list)
        .unwrap();

    assert_eq!(report.decisions.decided(), 0);
    assert_eq!(report.summary.confirmed + report.summary.suppressed, 0);
    assert_eq!(scene.status, before);
}

#[test]
fn only_listed_cells_are_written() {
    let mut scene = Scene::new();
    let mut positions = Vec::new();
    for i in 0..5 {
        let pos = scene.at(-1 + (i % 3), -4 + 2 * i);
        scene.peak(pos, 50.0 + 10.0 * i as f32);
        positions.push(pos);
    }
    let stray = scene.at(2, 0);
    scene.peak(stray, 500.0);
    let before = scene.status.clone();

    let list = CandidateList::new(positions.clone(), 1024).unwrap();
    let report = suppressor(5.0, 4)
        .run(&scene.charge, &mut scene.status, &list)
        .unwrap();

    assert_eq!(report.decisions.decided(), 5);
    assert_eq!(report.decisions.capacity(), 1024);
    assert!((5..1024).all(|idx| report.decisions.get(idx).is_none()));
    assert_eq!(scene.status.get(stray), before.get(stray));

    let extent = *scene.status.extent();
    for pad in 0..extent.pads() as u16 {
        for time in 0..extent.times() as u16 {
            let pos = GridPosition::new(0, pad, time);
            if !positions.contains(&pos) {
                assert_eq!(scene.status.get(pos), before.get(pos));
            }
        }
    }
    let kept: Vec<_> = report.kept_positions(&list).collect();
    assert_eq!(kept.len(), report.summary.confirmed);
}

#[test]
fn capacity_is_enforced_before_running() {
    let mut scene = Scene::new();
    scene.peak(PIVOT, 100.0);
    let suppressor = NoiseSuppressor::new(
        NeighborhoodGeometry::default(),
        SuppressionConfig {
            capacity: 1,
            ..SuppressionConfig::default()
        },
        Calibration::default(),
    )
    .unwrap();
    let list = CandidateList::new(vec![PIVOT, PIVOT], 8).unwrap();
    let before = scene.status.clone();

    let err = suppressor
        .run(&scene.charge, &mut scene.status, &list)
        .unwrap_err();
    assert_eq!(
        err,
        PeakSieveError::CapacityExceeded {
            count: 2,
            capacity: 1
        }
    );
    assert_eq!(scene.status, before);
}

#[test]
fn contract_violations_are_reported() {
    let mut scene = Scene::new();
    scene.charge(PIVOT, 100.0);
    let list = CandidateList::new(vec![PIVOT], 8).unwrap();
    let err = suppressor(5.0, 8)
        .run(&scene.charge, &mut scene.status, &list)
        .unwrap_err();
    assert!(matches!(
        err,
        PeakSieveError::CandidateContract { index: 0, .. }
    ));

    let outside = CandidateList::new(vec![GridPosition::new(0, 12, 0)], 8).unwrap();
    let err = suppressor(5.0, 8)
        .run(&scene.charge, &mut scene.status, &outside)
        .unwrap_err();
    assert!(matches!(
        err,
        PeakSieveError::PositionOutOfBounds { index: 0, .. }
    ));
}

#[test]
fn list_capacity_above_configured_capacity_is_rejected() {
    let mut scene = Scene::new();
    scene.peak(PIVOT, 100.0);
    let list = CandidateList::new(vec![PIVOT], usize::MAX).unwrap();
    let before = scene.status.clone();

    let err = NoiseSuppressor::new(
        NeighborhoodGeometry::default(),
        SuppressionConfig::default(),
        Calibration::default(),
    )
    .unwrap()
    .run(&scene.charge, &mut scene.status, &list)
    .unwrap_err();
    assert_eq!(
        err,
        PeakSieveError::CapacityExceeded {
            count: usize::MAX,
            capacity: 1 << 16,
        }
    );
    assert_eq!(scene.status, before);
}
