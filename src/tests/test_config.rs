use std::io::Write;
use std::path::Path;

use crate::config::{Aggregation, RecommenderConfig, StopWordLanguage, DEFAULT_ALPHA, DEFAULT_RANK};
use crate::dataset::InteractionType;
use crate::error::ConfigError;

fn parse(toml: &str) -> Result<RecommenderConfig, ConfigError> {
    RecommenderConfig::from_toml_str(toml, Path::new("test.toml"))
}

#[test]
fn test_default_weights() {
    let config = RecommenderConfig::default();
    let w = &config.weights;
    assert_eq!(w.weight(InteractionType::Liked), Some(1.0));
    assert_eq!(w.weight(InteractionType::Viewed), Some(0.5));
    assert_eq!(w.weight(InteractionType::Rated), Some(2.0));
    assert_eq!(w.weight(InteractionType::Inspired), None);
    assert_eq!(config.aggregation, Aggregation::Sum);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    crate::tests::init();
    let config = parse(
        r#"
        rank = 8
        aggregation = "max"

        [weights]
        inspired = 1.5
        "#,
    )
    .unwrap();
    assert_eq!(config.rank, 8);
    assert_eq!(config.aggregation, Aggregation::Max);
    assert_eq!(config.weights.inspired, Some(1.5));
    assert_eq!(config.weights.liked, Some(1.0));
    assert_eq!(config.default_alpha, DEFAULT_ALPHA);
    assert_eq!(config.stopwords, StopWordLanguage::English);

    let empty = parse("").unwrap();
    assert_eq!(empty.rank, DEFAULT_RANK);
}

#[test]
fn test_unknown_keys_rejected() {
    assert!(matches!(parse("rnak = 3"), Err(ConfigError::Parse { .. })));
    assert!(matches!(
        parse("[weights]\nshared = 1.0"),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_out_of_range_values_rejected() {
    let cases = [
        ("rank = 0", "rank"),
        ("default_k = 0", "default_k"),
        ("default_alpha = 1.5", "default_alpha"),
        ("[weights]\nviewed = -1.0", "weights.viewed"),
    ];
    for (toml, field) in cases {
        match parse(toml) {
            Err(ConfigError::Invalid { param, .. }) => assert_eq!(param, field),
            other => panic!("{toml}: expected invalid `{field}`, got {other:?}"),
        }
    }
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_k = 3\nstopwords = \"none\"").unwrap();
    let config = RecommenderConfig::load(file.path()).unwrap();
    assert_eq!(config.default_k, 3);
    assert_eq!(config.stopwords, StopWordLanguage::None);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = RecommenderConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_builder_rejects_invalid_config() {
    use crate::builder::RecommenderBuilder;
    use crate::error::RecommendError;

    let err = RecommenderBuilder::new()
        .with_default_alpha(2.0)
        .build(crate::tests::test_data::two_user_dataset())
        .unwrap_err();
    assert!(matches!(err, RecommendError::Config(ConfigError::Invalid { .. })));
}
