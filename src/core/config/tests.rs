use super::*;
use crate::core::errors::ScrivenerError;

fn expect_validation_error<T: std::fmt::Debug>(result: Result<T>) -> ScrivenerError {
    result.expect_err("expected validation failure")
}

#[test]
fn default_configs_validate_successfully() {
    ScrivenerConfig::default()
        .validate()
        .expect("scrivener default");
    IdentifierConfig::default()
        .validate()
        .expect("identifier default");
    MapperConfig::default().validate().expect("mapper default");
    BehaviorConfig::default()
        .validate()
        .expect("behavior default");
    TransferConfig::default()
        .validate()
        .expect("transfer default");
    ReviewConfig::default().validate().expect("review default");
}

#[test]
fn mapper_config_bounds_auto_clusters() {
    let mut config = MapperConfig::default();
    config.max_auto_clusters = 12;
    let err = expect_validation_error(config.validate());
    assert!(
        format!("{err}").contains("max_auto_clusters"),
        "unexpected error message: {err}"
    );
}

#[test]
fn behavior_config_rejects_out_of_range_percentile() {
    let mut config = BehaviorConfig::default();
    config.novelty_percentile = 140.0;
    let err = expect_validation_error(config.validate());
    assert!(matches!(err, ScrivenerError::Validation { .. }));
}

#[test]
fn transfer_config_rejects_zero_gradual_steps() {
    let mut config = TransferConfig::default();
    config.gradual_steps = 0;
    let err = expect_validation_error(config.validate());
    assert!(format!("{err}").contains("gradual_steps"));
}

#[test]
fn review_config_requires_positive_window() {
    let config = ReviewConfig {
        inactivity_window_secs: 0,
    };
    assert!(config.validate().is_err());
}

#[test]
fn review_config_rejects_unbounded_window() {
    let config = ReviewConfig {
        inactivity_window_secs: u64::MAX,
    };
    let err = config.validate().unwrap_err();
    assert!(format!("{err}").contains("inactivity_window_secs"));
    assert_eq!(
        config.inactivity_window().num_seconds(),
        ReviewConfig::MAX_INACTIVITY_WINDOW_SECS as i64
    );
}

#[test]
fn partial_yaml_fills_defaults() {
    let yaml = "mapper:\n  max_auto_clusters: 5\nreview:\n  inactivity_window_secs: 120\n";
    let config: ScrivenerConfig = serde_yaml::from_str(yaml).expect("parse yaml");
    assert_eq!(config.mapper.max_auto_clusters, 5);
    assert_eq!(config.review.inactivity_window_secs, 120);
    assert_eq!(config.identifier.max_units, 30);
    assert_eq!(config.transfer.gradual_steps, 3);
    config.validate().expect("partial config validates");
}

#[test]
fn yaml_file_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("scrivener.yml");

    let mut config = ScrivenerConfig::default();
    config.behavior.max_novelty_pairs = 3;
    config.to_yaml_file(&path).expect("write config");

    let loaded = ScrivenerConfig::from_yaml_file(&path).expect("read config");
    assert_eq!(loaded.behavior.max_novelty_pairs, 3);
    assert_eq!(loaded.fusion.weights, config.fusion.weights);
}

#[test]
fn missing_config_file_is_io_error() {
    let err = ScrivenerConfig::from_yaml_file("/definitely/not/here.yml").unwrap_err();
    assert!(matches!(err, ScrivenerError::Io { .. }));
}

#[test]
fn malformed_config_file_is_serialization_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.yml");
    std::fs::write(&path, "fusion: [unclosed\n").expect("write config");

    let err = ScrivenerConfig::from_yaml_file(&path).unwrap_err();
    match err {
        ScrivenerError::Serialization { data_type, .. } => {
            assert_eq!(data_type.as_deref(), Some("YAML"));
        }
        other => panic!("expected serialization error, got {other:?}"),
    }
}
