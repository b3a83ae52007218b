use camkit_toolpath::{
    DropCutterSettings, EngraveSettings, FreePathSettings, GridSettings, MillingStyle,
    PushCutterSettings, ScanDirection,
};

#[test]
fn test_settings_survive_json() {
    let drop = DropCutterSettings {
        min_z: Some(-1.0),
        max_z: None,
        safety_height: 12.5,
        grid: GridSettings {
            line_step: 0.25,
            sample_step: 0.1,
            direction: ScanDirection::XY,
            milling_style: MillingStyle::Conventional,
        },
    };
    let json = serde_json::to_string(&drop).unwrap();
    assert_eq!(serde_json::from_str::<DropCutterSettings>(&json).unwrap(), drop);

    let push = PushCutterSettings {
        epsilon: 1e-3,
        step: 0.2,
        directions: ScanDirection::Y,
    };
    let json = serde_json::to_string(&push).unwrap();
    assert_eq!(serde_json::from_str::<PushCutterSettings>(&json).unwrap(), push);

    let engrave = EngraveSettings {
        final_z: -2.0,
        step_down: 0.25,
        ..Default::default()
    };
    let json = serde_json::to_string(&engrave).unwrap();
    assert_eq!(serde_json::from_str::<EngraveSettings>(&json).unwrap(), engrave);
}

#[test]
fn test_missing_fields_take_defaults() {
    let drop: DropCutterSettings =
        serde_json::from_str(r#"{"safety_height": 5.0, "grid": {"direction": "xy"}}"#).unwrap();
    assert_eq!(drop.safety_height, 5.0);
    assert_eq!(drop.min_z, None);
    assert_eq!(drop.grid.direction, ScanDirection::XY);
    assert_eq!(drop.grid.line_step, GridSettings::default().line_step);

    let free: FreePathSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(free, FreePathSettings::default());

    let grid: GridSettings = serde_json::from_str(r#"{"milling_style": "climb"}"#).unwrap();
    assert_eq!(grid.milling_style, MillingStyle::Climb);
    assert!(grid.validate().is_ok());
}

#[test]
fn test_unknown_direction_is_rejected() {
    assert!(serde_json::from_str::<GridSettings>(r#"{"direction": "z"}"#).is_err());
}
