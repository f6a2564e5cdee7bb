use nomi_domain::config::{Config, ConfigSeverity};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 3001);
}

#[test]
fn empty_file_yields_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.room.ai_name, "Nomi");
    assert_eq!(config.room.context_window, 40);
    assert_eq!(config.room.history_cap(), 200);
    assert_eq!(config.turn.message_threshold, 3);
    assert_eq!(config.chat.rate_limit.max_messages, 6);
    assert_eq!(config.chat.rate_limit.window_ms, 5_000);
    assert_eq!(config.summarizer.recent_entries, 20);
    assert_eq!(config.voice.default_room, "global");
}

#[test]
fn partial_sections_keep_other_defaults() {
    let toml_str = r#"
[room]
ai_name = "Echo"

[turn]
debounce_ms = 250

[chat.rate_limit]
max_messages = 10
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.room.ai_name, "Echo");
    assert_eq!(config.room.context_window, 40);
    assert_eq!(config.turn.debounce_ms, 250);
    assert_eq!(config.turn.silence_threshold_ms, 15_000);
    assert_eq!(config.chat.rate_limit.max_messages, 10);
    assert_eq!(config.chat.rate_limit.window_ms, 5_000);
}

#[test]
fn default_cors_allows_only_localhost() {
    let config = Config::default();
    assert!(config.server.cors.allowed_origins.contains(&"http://localhost:*".to_string()));
    assert!(config.server.cors.allowed_origins.contains(&"http://127.0.0.1:*".to_string()));
}

#[test]
fn wildcard_cors_is_only_a_warning() {
    let toml_str = r#"
[server.cors]
allowed_origins = ["*"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    let issues = config.validate();
    let cors = issues
        .iter()
        .find(|i| i.field == "server.cors.allowed_origins")
        .expect("wildcard should be reported");
    assert_eq!(cors.severity, ConfigSeverity::Warning);
}

#[test]
fn blank_ai_name_fails_validation() {
    let toml_str = r#"
[room]
ai_name = "  "
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert!(config
        .validate()
        .iter()
        .any(|i| i.field == "room.ai_name" && i.severity == ConfigSeverity::Error));
}
