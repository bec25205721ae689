//! Config defaults must hold both for `Config::default()` and for an
//! empty TOML document (every section and field is serde-defaulted).

use diana_domain::config::Config;

#[test]
fn empty_toml_equals_defaults() {
    let from_toml: Config = toml::from_str("").unwrap();
    let default = Config::default();

    assert_eq!(from_toml.server.port, default.server.port);
    assert_eq!(from_toml.server.host, default.server.host);
    assert_eq!(from_toml.dialogue.max_questions, default.dialogue.max_questions);
    assert_eq!(
        from_toml.dialogue.conclusion_threshold,
        default.dialogue.conclusion_threshold
    );
    assert_eq!(from_toml.dialogue.reply_delay_ms, default.dialogue.reply_delay_ms);
    assert_eq!(from_toml.sessions.state_path, default.sessions.state_path);
    assert_eq!(from_toml.medical.model, default.medical.model);
    assert_eq!(from_toml.directory.search_radius, default.directory.search_radius);
    assert_eq!(from_toml.directory.max_results, default.directory.max_results);
}

#[test]
fn dialogue_defaults_match_workflow_constants() {
    let cfg = Config::default();
    assert_eq!(cfg.dialogue.conclusion_threshold, 0.9);
    assert_eq!(cfg.dialogue.specialty_similarity, 0.3);
    assert_eq!(cfg.dialogue.reply_delay_ms, 300);
    assert_eq!(cfg.directory.search_radius, 100);
    assert_eq!(cfg.directory.max_results, 5);
}

#[test]
fn partial_toml_overrides_only_named_fields() {
    let cfg: Config = toml::from_str(
        r#"
        [dialogue]
        max_questions = 8

        [server]
        port = 8080
        "#,
    )
    .unwrap();

    assert_eq!(cfg.dialogue.max_questions, 8);
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.dialogue.conclusion_threshold, 0.9);
    assert_eq!(cfg.server.host, "0.0.0.0");
}

#[test]
fn validate_flags_missing_credentials() {
    let warnings = Config::default().validate();
    assert!(warnings.iter().any(|w| w.contains("messaging.token")));
    assert!(warnings.iter().any(|w| w.contains("intent.access_token")));
}
