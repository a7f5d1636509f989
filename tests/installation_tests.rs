//! End-to-end scenarios for the installation driven by a simulated hand.

use glimmer::prelude::*;

const DT: f32 = 1.0 / 60.0;

fn config() -> InstallationConfig {
    let mut config = InstallationConfig::default();
    config.tree.count = 1_000;
    config.rings.count = 300;
    config.star.count = 100;
    config.snow.count = 500;
    config.seed = Some(2024);
    config
}

fn started(backend: SimulatedBackend) -> (Installation, SimHandle) {
    let hand = backend.handle();
    let mut installation = Installation::new(config(), Box::new(backend)).unwrap();
    installation.start();
    (installation, hand)
}

/// Advance the video by one frame and tick once.
fn step(installation: &mut Installation, hand: &SimHandle) -> FrameSnapshot {
    hand.next_frame();
    installation.tick(DT)
}

fn snow_positions(installation: &Installation) -> Vec<f32> {
    installation.scene().snow.population().positions().to_vec()
}

// ============================================================================
// Gesture to explosion
// ============================================================================

#[test]
fn open_hand_drives_explosion_to_one() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Custom(2.0));

    let first = step(&mut installation, &hand);
    let classification = first.classification.expect("first frame classified");
    assert!((classification.openness.unwrap() - 2.0).abs() < 1e-4);
    assert_eq!(first.state, GestureState::Frozen);
    assert_eq!(first.status, Status::FreezingTime);

    let mut previous = first.explosion;
    for _ in 0..180 {
        let snapshot = step(&mut installation, &hand);
        assert!(snapshot.frozen());
        assert!(snapshot.explosion >= previous);
        previous = snapshot.explosion;
    }
    assert!(installation.explosion() >= 0.99);
    assert_eq!(installation.status().indicator(), Indicator::Paused);
}

#[test]
fn frozen_snow_holds_still() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Open);
    step(&mut installation, &hand);

    let before = snow_positions(&installation);
    for _ in 0..30 {
        let snapshot = step(&mut installation, &hand);
        assert!(!snapshot.snow_moved);
    }
    assert_eq!(snow_positions(&installation), before);
}

#[test]
fn no_hand_keeps_flowing_and_snow_moves() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Absent);

    for frame in 0..10 {
        let before = snow_positions(&installation);
        let snapshot = step(&mut installation, &hand);
        assert_eq!(snapshot.state, GestureState::Flowing, "frame {frame}");
        assert_eq!(snapshot.status, Status::NoHandDetected);
        assert!(!snapshot.frozen());
        assert!(snapshot.snow_moved);
        assert_ne!(snow_positions(&installation), before, "frame {frame}");
    }
    assert_eq!(installation.explosion(), 0.0);
}

#[test]
fn releasing_the_hand_collapses_the_tree() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Open);
    for _ in 0..120 {
        step(&mut installation, &hand);
    }
    let peak = installation.explosion();
    assert!(peak > 0.9);

    hand.set_pose(HandPose::Fist);
    let snapshot = step(&mut installation, &hand);
    assert_eq!(snapshot.status, Status::Flowing);
    assert!(snapshot.explosion < peak);
    for _ in 0..240 {
        step(&mut installation, &hand);
    }
    assert!(installation.explosion() < 0.01);
}

#[test]
fn repeated_video_frames_are_not_reclassified() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Open);
    assert!(step(&mut installation, &hand).classification.is_some());

    // Display refresh outpacing the camera: same video time.
    for _ in 0..5 {
        let snapshot = installation.tick(DT);
        assert!(snapshot.classification.is_none());
        // The freeze level persists between classified frames.
        assert!(snapshot.frozen());
    }
    assert_eq!(hand.detections(), 1);
}

#[test]
fn threshold_separates_open_from_curled() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Custom(1.65));
    let snapshot = step(&mut installation, &hand);
    assert_eq!(snapshot.state, GestureState::Frozen);

    hand.set_pose(HandPose::Custom(1.55));
    let snapshot = step(&mut installation, &hand);
    assert_eq!(snapshot.state, GestureState::Flowing);
}

// ============================================================================
// Failures and teardown
// ============================================================================

#[test]
fn camera_error_is_terminal_and_flowing() {
    let (mut installation, hand) =
        started(SimulatedBackend::new().with_camera_failure("permission denied"));
    hand.set_pose(HandPose::Open);

    for _ in 0..20 {
        let snapshot = step(&mut installation, &hand);
        assert_eq!(snapshot.status, Status::CameraError);
        assert_eq!(snapshot.state, GestureState::Flowing);
        assert!(snapshot.snow_moved);
        assert!(snapshot.classification.is_none());
    }
    assert_eq!(installation.acquisition_state(), AcquisitionState::Failed);
    assert_eq!(hand.detector_loads(), 1);
    assert!(hand.released());
}

#[test]
fn detector_error_never_opens_camera() {
    let (mut installation, hand) =
        started(SimulatedBackend::new().with_detector_failure("model unavailable"));
    step(&mut installation, &hand);
    assert_eq!(installation.status(), Status::CameraError);
    assert!(!hand.camera_open());
}

#[test]
fn stop_releases_camera_and_detector() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    step(&mut installation, &hand);
    assert!(hand.camera_open());

    installation.stop();
    assert!(hand.detector_closed());
    assert!(hand.camera_stopped());
    assert_eq!(installation.acquisition_state(), AcquisitionState::Stopped);

    // The scene keeps ticking without acquisition.
    let snapshot = step(&mut installation, &hand);
    assert!(snapshot.classification.is_none());
    assert!(snapshot.snow_moved);
}

#[test]
fn stopping_while_frozen_lets_time_flow_again() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    hand.set_pose(HandPose::Open);
    for _ in 0..60 {
        step(&mut installation, &hand);
    }
    assert!(installation.state().is_frozen());

    installation.stop();
    assert_eq!(installation.state(), GestureState::Flowing);
    assert_eq!(installation.status().indicator(), Indicator::Live);

    for _ in 0..600 {
        let snapshot = installation.tick(DT);
        assert!(!snapshot.frozen());
        assert!(snapshot.snow_moved);
    }
    assert!(installation.explosion() < 0.01);
}

#[test]
fn stopping_after_camera_error_keeps_the_error() {
    let (mut installation, hand) =
        started(SimulatedBackend::new().with_camera_failure("no device"));
    step(&mut installation, &hand);
    installation.stop();
    assert_eq!(installation.status(), Status::CameraError);
    assert!(!installation.tick(DT).frozen());
}

#[test]
fn dropping_mid_startup_leaks_nothing() {
    let backend = SimulatedBackend::new().with_pending_polls(5);
    let (mut installation, hand) = started(backend);
    for _ in 0..3 {
        step(&mut installation, &hand);
    }
    drop(installation);
    assert!(hand.released());
    assert!(!hand.camera_open());
}

#[test]
fn dropping_running_installation_releases_everything() {
    let (mut installation, hand) = started(SimulatedBackend::new());
    step(&mut installation, &hand);
    drop(installation);
    assert!(hand.detector_closed());
    assert!(hand.camera_stopped());
    assert!(hand.released());
}

// ============================================================================
// Scene buffers
// ============================================================================

#[test]
fn populations_are_aligned_and_uploadable() {
    let installation = Installation::new(config(), Box::new(SimulatedBackend::new())).unwrap();
    let scene = installation.scene();
    for population in [&scene.tree, &scene.rings, &scene.star, scene.snow.population()] {
        assert!(population.is_aligned());
        for attribute in population.attributes() {
            let bytes = population.attribute_bytes(attribute).unwrap();
            assert_eq!(bytes.len(), population.len() * attribute.width() * 4);
        }
    }
    assert_eq!(
        scene.tree.attributes(),
        vec![
            Attribute::Position,
            Attribute::Color,
            Attribute::Size,
            Attribute::Randomness,
            Attribute::Direction
        ]
    );
}

#[test]
fn config_round_trips_through_json_file() {
    let dir = std::env::temp_dir().join(format!("glimmer-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("installation.json");

    let mut original = config();
    original.explosion = ExplosionSource::Fixed(0.0);
    original.save(&path).unwrap();
    let loaded = InstallationConfig::load(&path).unwrap();
    assert_eq!(loaded, original);

    std::fs::remove_dir_all(&dir).unwrap();
}
