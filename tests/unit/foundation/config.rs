use super::*;

#[test]
fn empty_object_is_default() {
    let cfg = RunConfig::from_json_str("{}").unwrap();
    assert_eq!(cfg, RunConfig::default());
    assert_eq!(cfg.image.width, 600);
    assert_eq!(cfg.image.height, 504);
    assert_eq!(cfg.devices.ion, PathBuf::from("/dev/ion"));
    assert_eq!(cfg.backend, BackendChoice::Linux);
    cfg.validate().unwrap();
}

#[test]
fn partial_override_keeps_other_defaults() {
    let cfg = RunConfig::from_json_str(
        r#"{
            "backend": "in_memory",
            "image": { "path": "frame.raw", "width": 64 },
            "buffers": 2,
            "in_memory": { "display": { "width": 320, "height": 240 } }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.backend, BackendChoice::InMemory);
    assert_eq!(cfg.image.path, PathBuf::from("frame.raw"));
    assert_eq!(cfg.image.width, 64);
    assert_eq!(cfg.image.height, 504);
    assert_eq!(cfg.buffers, 2);
    assert_eq!(cfg.in_memory.display, Size::new(320, 240));
    assert_eq!(cfg.devices, DevicePaths::default());
}

#[test]
fn unknown_fields_are_rejected() {
    let err = RunConfig::from_json_str(r#"{ "rotation": 1 }"#).unwrap_err();
    assert!(err.to_string().contains("validation error:"));
}

#[test]
fn validate_rejects_bad_ranges() {
    let mut cfg = RunConfig::default();
    cfg.buffers = 0;
    assert!(cfg.validate().is_err());

    let mut cfg = RunConfig::default();
    cfg.frame_budget_secs = 0.0;
    assert!(cfg.validate().is_err());

    let mut cfg = RunConfig::default();
    cfg.frame_budget_secs = f64::NAN;
    assert!(cfg.validate().is_err());

    let mut cfg = RunConfig::default();
    cfg.image.height = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn from_path_reports_missing_file_as_io() {
    let err = RunConfig::from_path("/nonexistent/ionblit.json").unwrap_err();
    assert!(matches!(err, BlitError::Io { .. }));
}

#[test]
fn frame_budget_converts_seconds() {
    let mut cfg = RunConfig::default();
    cfg.frame_budget_secs = 0.25;
    assert_eq!(cfg.frame_budget(), Duration::from_millis(250));
}
