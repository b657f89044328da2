use fractalzoom_core::{
    colorize, escape_time, precision_loss, BackendKind, EngineConfig, RenderParameters,
    ViewBounds, ViewRequest, ViewState,
};

// ============================================================================
// View state driven through a session
// ============================================================================

#[test]
fn state_from_config_uses_whole_set_view() {
    let config = EngineConfig::default();
    let state = ViewState::from_config(&config);

    assert_eq!(state.bounds, ViewBounds::initial(1920, 1080));
    assert_eq!(state.params.max_iterations, 50);
    assert_eq!(state.params.colour_period, 128.0);
    assert!(state.params.blur_enabled);
}

#[test]
fn request_snapshot_is_independent_of_later_edits() {
    let config = EngineConfig::default();
    let mut state = ViewState::from_config(&config);
    let before = state.request();

    let zoomed = ViewBounds::new(-1.0, 0.0, -0.5, 0.5).unwrap();
    state.params.max_iterations = 400;
    state.bounds = zoomed;
    let after = state.request();

    assert_eq!(before.max_iterations, 50);
    assert_eq!(before.bounds, ViewBounds::initial(1920, 1080));
    assert_eq!(after.max_iterations, 400);
    assert_eq!(after.bounds, zoomed);
    assert_ne!(before, after);
}

#[test]
fn reset_after_deep_zoom() {
    let config = EngineConfig::default();
    let mut state = ViewState::from_config(&config);
    let x = -1.253_343_253_354_873_6;
    state.bounds = ViewBounds::new(x, x + 1e-15, -0.344, -0.344 + 1e-15).unwrap();
    state.params.max_iterations = 1_389_952;
    assert!(precision_loss(&state.bounds, 1920, 1080));

    state.reset(&config);

    assert!(!precision_loss(&state.bounds, 1920, 1080));
    assert_eq!(state.params.max_iterations, config.initial_max_iterations);
}

#[test]
fn request_serializes_to_json() {
    let params = RenderParameters {
        resolution_x: 64,
        resolution_y: 64,
        ..RenderParameters::default()
    };
    let req = ViewRequest::new(ViewBounds::initial(64, 64), &params);
    let json = serde_json::to_string(&req).unwrap();
    let back: ViewRequest = serde_json::from_str(&json).unwrap();
    assert_eq!(back, req);
}

#[test]
fn config_file_selects_backend() {
    let config =
        EngineConfig::from_json(r#"{"backend": "arbitrary_precision", "colour_period": 32.0}"#)
            .unwrap();
    assert_eq!(config.backend, BackendKind::ArbitraryPrecision);
    let state = ViewState::from_config(&config);
    assert_eq!(state.params.colour_period, 32.0);
}

// ============================================================================
// Reference kernel through the colorizer
// ============================================================================

#[test]
fn centre_of_initial_view_is_black() {
    let b = ViewBounds::initial(100, 100);
    let (re, im) = b.point_at(50, 50, 100, 100);
    let r = escape_time(re, im, 50);
    assert_eq!(colorize(&r, 50, 128.0), [0.0, 0.0, 0.0]);
}

#[test]
fn corner_of_initial_view_is_coloured() {
    let b = ViewBounds::initial(100, 100);
    let (re, im) = b.point_at(0, 0, 100, 100);
    let r = escape_time(re, im, 50);
    assert!(r.iterations < 50);
    let rgb = colorize(&r, 50, 128.0);
    assert!(rgb.iter().all(|c| (0.0..=1.0).contains(c)));
}
