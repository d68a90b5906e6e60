use std::sync::Mutex;

use tempfile::NamedTempFile;

use framegate::config::GateConfig;
use framegate::coverage::CoverageStrategy;
use framegate::{PromotionRule, ScoringPolicy};

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "FRAMEGATE_CONFIG",
        "FRAMEGATE_POLICY",
        "FRAMEGATE_COVERAGE",
        "FRAMEGATE_PROMOTION",
        "FRAMEGATE_FPS",
        "FRAMEGATE_ACCEPT_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = GateConfig::load().expect("load config");
    assert_eq!(cfg, GateConfig::default());
    assert_eq!(cfg.params.policy, ScoringPolicy::Strict);
    assert_eq!(cfg.fps, 30.0);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "policy": "lenient",
        "promotion": "any_improvement",
        "fps": 25,
        "scoring": {
            "accept_threshold": 0.55,
            "frame_stride": 4,
            "face_overlap_threshold": 0.4
        },
        "coverage": {
            "strategy": "rectangle"
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("FRAMEGATE_CONFIG", file.path());
    std::env::set_var("FRAMEGATE_COVERAGE", "landmark");
    std::env::set_var("FRAMEGATE_ACCEPT_THRESHOLD", "0.6");

    let cfg = GateConfig::load().expect("load config");

    assert_eq!(cfg.params.policy, ScoringPolicy::Lenient);
    assert_eq!(cfg.params.accept_threshold, 0.6);
    assert_eq!(cfg.params.frame_stride, 4);
    assert_eq!(cfg.params.face_overlap_threshold, 0.4);
    assert_eq!(cfg.params.body_overlap_threshold, 0.7);
    assert_eq!(cfg.coverage, CoverageStrategy::Landmark);
    assert_eq!(cfg.promotion, PromotionRule::AnyImprovement);
    assert_eq!(cfg.fps, 25.0);
    assert_eq!(cfg.pipeline().fps, 25.0);

    clear_env();
}

#[test]
fn env_policy_switches_preset() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMEGATE_POLICY", "lenient");
    let cfg = GateConfig::load().expect("load config");
    assert_eq!(cfg.params.accept_threshold, 0.5);
    assert_eq!(cfg.params.frame_stride, 5);
    assert!(!cfg.params.require_valid_coverage);

    clear_env();
}

#[test]
fn malformed_env_and_file_are_rejected() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("FRAMEGATE_FPS", "fast");
    assert!(GateConfig::load().is_err());
    clear_env();

    std::env::set_var("FRAMEGATE_ACCEPT_THRESHOLD", "2.0");
    assert!(GateConfig::load().is_err());
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ not json").expect("write config");
    std::env::set_var("FRAMEGATE_CONFIG", file.path());
    let err = GateConfig::load().unwrap_err();
    assert!(err.to_string().contains("invalid config file"));

    clear_env();
}
