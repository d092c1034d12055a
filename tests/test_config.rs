mod common;
use common::*;
use omnik_bridge::config::{Config, ConfigWrapper};
use std::io::Write;
use std::time::Duration;

#[test]
fn defaults() {
    let config = Factory::config();

    assert_eq!(config.listen.host(), "0.0.0.0");
    assert_eq!(config.listen.port(), 10004);
    assert_eq!(config.listen.read_timeout(), 900);
    assert_eq!(config.loglevel, "info");
    assert!(!config.strict_frame_check);
    assert_eq!(config.availability_timeout, Duration::from_secs(900));
    assert_eq!(config.max_loggers, 16);

    assert!(config.mqtt.enabled());
    assert_eq!(config.mqtt.port(), 1883);
    assert_eq!(config.mqtt.namespace(), "solar");
    assert!(config.mqtt.homeassistant().enabled());
    assert_eq!(config.mqtt.homeassistant().prefix(), "homeassistant");
}

#[test]
fn full_config() {
    let config = Config::from_yaml(
        r#"
listen:
  host: 127.0.0.1
  port: 8899
  read_timeout: 60
mqtt:
  enabled: true
  host: broker
  port: 1884
  username: user
  password: secret
  namespace: omnik
  homeassistant:
    enabled: false
    prefix: ha
loglevel: debug
strict_frame_check: true
availability_timeout: 300
"#,
    )
    .unwrap();

    assert_eq!(config.listen.host(), "127.0.0.1");
    assert_eq!(config.listen.port(), 8899);
    assert_eq!(config.listen.read_timeout(), 60);
    assert_eq!(config.mqtt.username(), &Some("user".to_string()));
    assert_eq!(config.mqtt.password(), &Some("secret".to_string()));
    assert_eq!(config.mqtt.homeassistant().prefix(), "ha");
    assert!(config.strict_frame_check);
    assert_eq!(config.availability_timeout, Duration::from_secs(300));

    let wrapper = ConfigWrapper::from_config(config);
    assert!(!wrapper.homeassistant_enabled());
    assert!(wrapper.strict_frame_check());
    assert_eq!(wrapper.loglevel(), "debug");
}

#[test]
fn homeassistant_needs_mqtt() {
    let config = Config::from_yaml(
        r#"
mqtt:
  enabled: false
  host: ""
"#,
    )
    .unwrap();

    assert!(!ConfigWrapper::from_config(config).homeassistant_enabled());
}

#[test]
fn rejects_invalid_values() {
    for yaml in [
        "mqtt: {host: broker}\nlisten: {port: 0}",
        "mqtt: {host: broker}\nlisten: {host: ''}",
        "mqtt: {host: broker}\nlisten: {read_timeout: 0}",
        "mqtt: {host: ''}",
        "mqtt: {host: broker, namespace: ''}",
        "mqtt: {host: broker}\navailability_timeout: 0",
        "mqtt: {host: broker}\nmax_loggers: 0",
    ] {
        assert!(Config::from_yaml(yaml).is_err(), "accepted: {}", yaml);
    }
}

#[test]
fn mqtt_section_is_required() {
    assert!(Config::from_yaml("loglevel: debug\n").is_err());
}

#[test]
fn reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "mqtt:\n  host: broker\nlisten:\n  port: 9000").unwrap();

    let wrapper = ConfigWrapper::new(file.path().to_string_lossy().into_owned()).unwrap();
    assert_eq!(wrapper.listen().port(), 9000);
    assert_eq!(wrapper.mqtt().host(), "broker");
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.yaml");

    assert!(ConfigWrapper::new(path.to_string_lossy().into_owned()).is_err());
}
