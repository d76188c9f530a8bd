use approx::assert_relative_eq;
use orbitview_viewer::{CameraConfig, CameraController, DragOutcome, InteractionMode, Viewport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn controller(config: CameraConfig) -> CameraController {
    CameraController::new(config, Viewport::new(600, 400)).unwrap()
}

#[test]
fn test_arcball_preserves_distance_over_random_drags() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..20 {
        let mut camera = controller(CameraConfig::default());
        let distance = camera.state().distance();
        let (mut x, mut y) = (300.0f32, 200.0f32);
        camera.begin_drag(x, y);
        for _ in 0..200 {
            x += rng.gen_range(-80.0..80.0);
            y += rng.gen_range(-80.0..80.0);
            assert_eq!(camera.update_drag(x, y), Some(DragOutcome::Camera));
            let state = camera.state();
            assert_relative_eq!(state.distance(), distance, epsilon = 1e-3);
            assert!(state.basis().is_ok());
            assert_eq!(state.target(), orbitview_core::Point3f::origin());
        }
        camera.end_drag();
    }
}

#[test]
fn test_arcball_drags_split_into_steps_agree() {
    let mut whole = controller(CameraConfig::default());
    whole.begin_drag(0.0, 0.0);
    whole.update_drag(90.0, 0.0);

    let mut steps = controller(CameraConfig::default());
    steps.begin_drag(0.0, 0.0);
    for x in [30.0, 60.0, 90.0] {
        steps.update_drag(x, 0.0);
    }
    assert_relative_eq!(whole.state().position(), steps.state().position(), epsilon = 1e-4);
}

#[test]
fn test_zoom_never_below_minimum() {
    let mut rng = StdRng::seed_from_u64(11);
    let config = CameraConfig {
        min_distance: 0.25,
        ..CameraConfig::default()
    };
    let mut camera = controller(config);
    for _ in 0..500 {
        let delta = rng.gen_range(-50.0..50.0) * if rng.gen_bool(0.1) { 1e4 } else { 1.0 };
        camera.zoom(delta);
        let distance = camera.state().distance();
        assert!(distance >= 0.25 - 1e-5, "distance {} after zoom {}", distance, delta);
        assert!(distance.is_finite());
    }
    camera.zoom(f32::MAX);
    assert_relative_eq!(camera.state().distance(), 0.25, epsilon = 1e-5);
}

#[test]
fn test_zoom_keeps_view_direction() {
    let mut camera = controller(CameraConfig::default());
    camera.begin_drag(0.0, 0.0);
    camera.update_drag(120.0, 45.0);
    camera.end_drag();
    let (forward, _, _) = camera.state().basis().unwrap();
    camera.zoom(3.0);
    let (after, _, _) = camera.state().basis().unwrap();
    assert_relative_eq!(forward, after, epsilon = 1e-5);
}

#[test]
fn test_model_mode_leaves_camera_unchanged() {
    let mut camera = controller(CameraConfig::default());
    camera.set_mode(InteractionMode::Model);
    let before = camera.state().clone();
    camera.begin_drag(100.0, 100.0);
    let outcome = camera.update_drag(150.0, 100.0);
    assert!(matches!(outcome, Some(DragOutcome::ModelRotation(_))));
    assert_eq!(camera.state(), &before);
}
