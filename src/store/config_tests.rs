use super::*;

#[test]
fn default_config_validates_and_round_trips_through_disk() {
    let root = tempfile::tempdir().expect("tempdir");
    let config = default_config("country_map");
    validate_config(&config).expect("default config valid");

    let txn = StoreTxn::begin(&StorePaths::new(root.path().to_path_buf())).expect("begin");
    stage_config(&txn, &config).expect("stage config");
    txn.publish().expect("publish");
    let loaded = load_config(root.path()).expect("load config");
    assert_eq!(loaded, config);
    assert_eq!(loaded.change_categories.len(), 6);
}

#[test]
fn unknown_fields_are_rejected() {
    let root = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        root.path().join("config.json"),
        r#"{"schema_version": 1, "entity": "country_map", "surprise": true}"#,
    )
    .expect("write config");
    let err = load_config(root.path()).expect_err("unknown field");
    assert!(format!("{err:#}").contains("surprise"));
}

#[test]
fn validation_rejects_bad_entities_categories_and_keys() {
    let mut config = default_config("country map");
    assert!(validate_config(&config).is_err());

    config.entity = "country_map".to_string();
    config.change_categories.push("none".to_string());
    let err = validate_config(&config).expect_err("placeholder category");
    assert!(err.to_string().contains("placeholder"));

    config.change_categories = vec!["OTHER".to_string(), "other".to_string()];
    let err = validate_config(&config).expect_err("duplicate category");
    assert!(err.to_string().contains("duplicate"));

    config.change_categories = vec!["OTHER".to_string()];
    config.key_columns = vec!["string_01".to_string(), "bad key".to_string()];
    let err = validate_config(&config).expect_err("bad key column");
    assert!(err.to_string().contains("bad key"));

    config.key_columns.pop();
    validate_config(&config).expect("valid");

    config.schema_version = 7;
    assert!(validate_config(&config).is_err());
}
