use crate::prelude::*;

use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_listen")]
    pub listen: Listen,
    pub mqtt: Mqtt,

    #[serde(default = "Config::default_loglevel")]
    pub loglevel: String,

    /// Also verify checksum and terminator bytes of every frame.
    #[serde(default = "Config::default_strict_frame_check")]
    pub strict_frame_check: bool,

    /// A logger that has not sent a decodable frame for this long is marked offline.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "Config::default_availability_timeout")]
    pub availability_timeout: Duration,

    /// Loggers tracked at once; frames from further logger ids are dropped.
    #[serde(default = "Config::default_max_loggers")]
    pub max_loggers: usize,
}

// Listen {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Listen {
    #[serde(default = "Config::default_listen_host")]
    pub host: String,
    #[serde(default = "Config::default_listen_port")]
    pub port: u16,

    pub read_timeout: Option<u64>,
}
impl Listen {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn read_timeout(&self) -> u64 {
        self.read_timeout.unwrap_or(900) // 15 minutes
    }
} // }}}

// HomeAssistant {{{
#[derive(Clone, Debug, Deserialize)]
pub struct HomeAssistant {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    #[serde(default = "Config::default_mqtt_homeassistant_prefix")]
    pub prefix: String,
}

impl HomeAssistant {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
} // }}}

// Mqtt {{{
#[derive(Clone, Debug, Deserialize)]
pub struct Mqtt {
    #[serde(default = "Config::default_enabled")]
    pub enabled: bool,

    pub host: String,
    #[serde(default = "Config::default_mqtt_port")]
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,

    #[serde(default = "Config::default_mqtt_namespace")]
    pub namespace: String,

    #[serde(default = "Config::default_mqtt_homeassistant")]
    pub homeassistant: HomeAssistant,
}
impl Mqtt {
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &Option<String> {
        &self.username
    }

    pub fn password(&self) -> &Option<String> {
        &self.password
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn homeassistant(&self) -> &HomeAssistant {
        &self.homeassistant
    }
} // }}}

pub struct ConfigWrapper {
    config: Arc<Mutex<Config>>,
}

impl Clone for ConfigWrapper {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
        }
    }
}

impl ConfigWrapper {
    pub fn new(file: String) -> Result<Self> {
        Ok(Self::from_config(Config::new(file)?))
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            config: Arc::new(Mutex::new(config)),
        }
    }

    // a panic while holding the lock cannot leave a Config half-written, so
    // poisoning is ignored
    fn lock(&self) -> MutexGuard<'_, Config> {
        self.config.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn listen(&self) -> Listen {
        self.lock().listen.clone()
    }

    pub fn mqtt(&self) -> Mqtt {
        self.lock().mqtt.clone()
    }

    pub fn loglevel(&self) -> String {
        self.lock().loglevel.clone()
    }

    pub fn strict_frame_check(&self) -> bool {
        self.lock().strict_frame_check
    }

    pub fn availability_timeout(&self) -> Duration {
        self.lock().availability_timeout
    }

    pub fn max_loggers(&self) -> usize {
        self.lock().max_loggers
    }

    pub fn log_summary(&self) {
        self.lock().log_summary()
    }

    pub fn homeassistant_enabled(&self) -> bool {
        let config = self.lock();
        config.mqtt.enabled && config.mqtt.homeassistant.enabled
    }
}

impl Config {
    pub fn new(file: String) -> Result<Self> {
        let content = std::fs::read_to_string(&file)
            .map_err(|err| anyhow!("config.rs:error reading {}: {}", file, err))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    // called once logging is up, which needs the loglevel from this config
    pub fn log_summary(&self) {
        info!("Configuration loaded successfully:");
        info!("  Listen: {}:{}", self.listen.host, self.listen.port);
        info!("    Read Timeout: {}s", self.listen.read_timeout());

        info!("  MQTT: {}", if self.mqtt.enabled { "enabled" } else { "disabled" });
        if self.mqtt.enabled {
            info!("    Host: {}", self.mqtt.host);
            info!("    Port: {}", self.mqtt.port);
            info!("    Namespace: {}", self.mqtt.namespace);
            info!(
                "    Home Assistant: {}",
                if self.mqtt.homeassistant.enabled { "enabled" } else { "disabled" }
            );
        }

        info!("  Strict Frame Check: {}", self.strict_frame_check);
        info!("  Availability Timeout: {}s", self.availability_timeout.as_secs());
        info!("  Max Loggers: {}", self.max_loggers);
        info!("  Log Level: {}", self.loglevel);
    }

    fn validate(&self) -> Result<()> {
        if self.listen.port == 0 {
            bail!("listen.port must be between 1 and 65535");
        }
        if self.listen.host.is_empty() {
            return Err(anyhow!("config.rs:listen host cannot be empty"));
        }
        if self.listen.read_timeout() == 0 {
            return Err(anyhow!("config.rs:Invalid read timeout: 0"));
        }

        if self.mqtt.enabled {
            if self.mqtt.port == 0 {
                bail!("mqtt.port must be between 1 and 65535");
            }
            if self.mqtt.host.is_empty() {
                return Err(anyhow!("config.rs:MQTT host cannot be empty"));
            }
            if self.mqtt.namespace.is_empty() {
                return Err(anyhow!("config.rs:MQTT namespace cannot be empty"));
            }
        }

        if self.availability_timeout.is_zero() {
            return Err(anyhow!("config.rs:Invalid availability timeout: 0"));
        }
        if self.max_loggers == 0 {
            return Err(anyhow!("config.rs:Invalid max loggers: 0"));
        }

        Ok(())
    }

    fn default_listen() -> Listen {
        Listen {
            host: Self::default_listen_host(),
            port: Self::default_listen_port(),
            read_timeout: None,
        }
    }

    fn default_listen_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_listen_port() -> u16 {
        10004
    }

    fn default_mqtt_port() -> u16 {
        1883
    }

    fn default_mqtt_namespace() -> String {
        "omnik".to_string()
    }

    fn default_mqtt_homeassistant() -> HomeAssistant {
        HomeAssistant {
            enabled: Self::default_enabled(),
            prefix: Self::default_mqtt_homeassistant_prefix(),
        }
    }

    fn default_mqtt_homeassistant_prefix() -> String {
        "homeassistant".to_string()
    }

    fn default_enabled() -> bool {
        true
    }

    fn default_loglevel() -> String {
        "info".to_string()
    }

    fn default_strict_frame_check() -> bool {
        false
    }

    fn default_availability_timeout() -> Duration {
        Duration::from_secs(900)
    }

    fn default_max_loggers() -> usize {
        16
    }
}
