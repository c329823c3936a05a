//! Tests for configuration loading and validation.

use crate::config::Config;
use crate::types::Modality;

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.classifier.supervised_min_confirmations, 5);
    assert_eq!(config.classifier.top_n, 10);
    assert!((config.mapper.acceptance_threshold - 0.6).abs() < f32::EPSILON);
    assert!((config.mapper.tie_band - 0.05).abs() < f32::EPSILON);
}

#[test]
fn test_out_of_range_threshold_rejected() {
    let mut config = Config::default();
    config.mapper.acceptance_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.mapper.tie_band = -0.1;
    assert!(config.validate().is_err());
}

#[test]
fn test_zero_counts_rejected() {
    let mut config = Config::default();
    config.classifier.top_n = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.classifier.supervised_min_confirmations = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_parse_toml_with_schemas() {
    let toml_str = r#"
        [classifier]
        top_n = 5

        [mapper]
        acceptance_threshold = 0.7

        [[ingest.schemas]]
        modality = "text"
        model_id = "minilm"
        model_version = "1.0"
        dimension = 384
    "#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.classifier.top_n, 5);
    assert!((config.mapper.acceptance_threshold - 0.7).abs() < f32::EPSILON);

    let registry = config.ingest.build_registry().unwrap();
    assert_eq!(
        registry.dimension_for(Modality::Text, "minilm", "1.0"),
        Some(384)
    );
}

#[test]
fn test_registry_build_rejects_oversized_dimension() {
    let toml_str = r#"
        [ingest]
        max_dimension = 128

        [[ingest.schemas]]
        modality = "image"
        model_id = "clip"
        model_version = "2024.1"
        dimension = 768
    "#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config.ingest.build_registry().is_err());
}
