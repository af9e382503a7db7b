use super::*;
use crate::foundation::core::Color;

#[test]
fn parses_kinds_and_defaults_missing_fields() {
    let cfg = StackConfig::from_json_str(
        r#"{
            "effects": [
                {"kind": "bloom", "iterations": 2},
                {"kind": "brightness_saturation_contrast", "saturation": 0.0},
                {"kind": "edge_detection", "edge_color": {"r": 1.0, "g": 0.0, "b": 0.0}},
                {"kind": "fog"}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(cfg.effects.len(), 4);
    assert_eq!(
        cfg.effects[0],
        EffectConfig::Bloom(BloomConfig {
            iterations: 2,
            ..BloomConfig::default()
        })
    );
    let EffectConfig::EdgeDetection(edge) = cfg.effects[2] else {
        panic!("expected edge detection, got {:?}", cfg.effects[2]);
    };
    assert_eq!(edge.edge_color, Color::rgb(1.0, 0.0, 0.0));
    assert_eq!(cfg.effects[3], EffectConfig::Fog(FogConfig::default()));
    assert_eq!(cfg.camera, Camera::default());
}

#[test]
fn unknown_fields_and_kinds_are_rejected() {
    let err = StackConfig::from_json_str(r#"{"effects": [{"kind": "bloom", "glow": 1}]}"#)
        .unwrap_err();
    assert!(matches!(err, ScreenFxError::Serde(_)), "{err}");

    let err = StackConfig::from_json_str(r#"{"effects": [{"kind": "lens_flare"}]}"#).unwrap_err();
    assert!(matches!(err, ScreenFxError::Serde(_)));

    assert!(StackConfig::from_json_str(r#"{"effect": []}"#).is_err());
}

#[test]
fn out_of_range_values_clamp_on_build() {
    let cfg = EffectConfig::Bloom(BloomConfig {
        iterations: 12,
        downsample: 40,
        ..BloomConfig::default()
    });
    let EffectConfig::Bloom(c) = cfg.clamped() else {
        panic!("kind changed");
    };
    assert_eq!((c.iterations, c.downsample), (4, 8));

    let cfg = EffectConfig::MotionBlur(MotionBlurConfig { blur_size: -1.0 });
    assert_eq!(
        cfg.clamped(),
        EffectConfig::MotionBlur(MotionBlurConfig { blur_size: 0.0 })
    );
}

#[test]
fn defaults_document_survives_json() {
    let cfg = StackConfig {
        effects: EffectConfig::all_defaults(),
        ..StackConfig::default()
    };
    let json = cfg.to_json_pretty().unwrap();
    assert!(json.contains(r#""kind": "dissolve""#));
    assert!(json.contains(r#""kind": "edge_detect_normals_and_depth""#));
    assert_eq!(StackConfig::from_json_str(&json).unwrap(), cfg);
}

#[test]
fn build_stack_keeps_order() {
    let cfg = StackConfig {
        effects: vec![
            EffectConfig::GaussianBlur(GaussianBlurConfig::default()),
            EffectConfig::MotionBlur(MotionBlurConfig::default()),
            EffectConfig::Dissolve(DissolveConfig::default()),
        ],
        ..StackConfig::default()
    };
    let stack = cfg.build_stack().unwrap();
    assert_eq!(stack.names(), ["gaussian_blur", "motion_blur", "dissolve"]);
    assert!(stack.depth_mode().depth);
}

#[test]
fn invalid_camera_fails_build() {
    let cfg = StackConfig {
        camera: Camera {
            near: 0.0,
            ..Camera::default()
        },
        ..StackConfig::default()
    };
    assert!(matches!(cfg.build_stack(), Err(ScreenFxError::Validation(_))));
}

#[test]
fn missing_file_is_a_validation_error() {
    let err = StackConfig::from_path("target/does-not-exist/stack.json").unwrap_err();
    assert!(matches!(err, ScreenFxError::Validation(_)));
}
