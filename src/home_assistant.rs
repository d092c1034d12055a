use crate::prelude::*;

use serde::Serialize;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

// Sensor {{{
/// The entities published for every logger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sensor {
    LoggerId,
    InverterId,
    Temperature,
    Power,
    EnergyToday,
    EnergyTotal,
    OperatingHours,
}

impl Sensor {
    pub const ALL: [Sensor; 7] = [
        Sensor::LoggerId,
        Sensor::InverterId,
        Sensor::Temperature,
        Sensor::Power,
        Sensor::EnergyToday,
        Sensor::EnergyTotal,
        Sensor::OperatingHours,
    ];

    /// Last topic segment of the state topic.
    pub fn key(self) -> &'static str {
        use Sensor::*;

        match self {
            LoggerId => "logger_id",
            InverterId => "inverter_id",
            Temperature => "temperature",
            Power => "power",
            EnergyToday => "e_today",
            EnergyTotal => "e_total",
            OperatingHours => "operating_hours",
        }
    }

    pub fn name(self) -> &'static str {
        use Sensor::*;

        match self {
            LoggerId => "logger-id",
            InverterId => "inverter-id",
            Temperature => "temperature",
            Power => "power",
            EnergyToday => "E-today",
            EnergyTotal => "E-total",
            OperatingHours => "operating-hours",
        }
    }

    pub fn icon(self) -> &'static str {
        use Sensor::*;

        match self {
            LoggerId | InverterId => "mdi:barcode",
            Temperature => "mdi:thermometer",
            Power => "mdi:solar-power",
            EnergyToday | EnergyTotal => "mdi:transmission-tower-import",
            OperatingHours => "mdi:clock-outline",
        }
    }

    pub fn device_class(self) -> Option<&'static str> {
        use Sensor::*;

        match self {
            LoggerId | InverterId => None,
            Temperature => Some("temperature"),
            Power => Some("power"),
            EnergyToday | EnergyTotal => Some("energy"),
            OperatingHours => Some("duration"),
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        use Sensor::*;

        match self {
            LoggerId | InverterId => None,
            Temperature => Some("°C"),
            Power => Some("W"),
            EnergyToday | EnergyTotal => Some("kWh"),
            OperatingHours => Some("h"),
        }
    }

    pub fn state_class(self) -> Option<&'static str> {
        match self {
            Sensor::EnergyToday | Sensor::EnergyTotal => Some("total_increasing"),
            _ => None,
        }
    }

    /// Decimals a numeric sensor is published with; `None` for text sensors.
    pub fn precision(self) -> Option<usize> {
        use Sensor::*;

        match self {
            LoggerId | InverterId => None,
            Power | OperatingHours => Some(0),
            Temperature | EnergyTotal => Some(1),
            EnergyToday => Some(2),
        }
    }

    pub fn has_attributes(self) -> bool {
        matches!(self, Sensor::LoggerId | Sensor::InverterId)
    }

    // only temperature follows the logger's availability; the other sensors keep
    // their last value while the logger is silent
    pub fn follows_availability(self) -> bool {
        self == Sensor::Temperature
    }

    pub fn format(self, value: f64) -> String {
        match self.precision() {
            Some(precision) => Utils::with_precision(value, precision),
            None => value.to_string(),
        }
    }
} // }}}

#[derive(Debug, Serialize)]
struct Device {
    identifiers: Vec<String>,
    manufacturer: String,
    name: String,
    model: String,
    sw_version: String,
}

#[derive(Debug, Serialize)]
struct Entity<'a> {
    name: &'a str,
    unique_id: String,
    state_topic: String,
    icon: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    unit_of_measurement: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_display_precision: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    json_attributes_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability_topic: Option<String>,
    device: &'a Device,
}

/// Discovery configuration for one logger.
pub struct Config {
    logger_id: String,
    mqtt_config: config::Mqtt,
}

impl Config {
    pub fn new(logger_id: &str, mqtt_config: &config::Mqtt) -> Self {
        Self {
            logger_id: logger_id.to_owned(),
            mqtt_config: mqtt_config.clone(),
        }
    }

    pub fn all(&self) -> Result<Vec<mqtt::Message>> {
        let device = self.device();

        Sensor::ALL
            .iter()
            .map(|sensor| self.sensor(*sensor, &device))
            .collect()
    }

    fn device(&self) -> Device {
        Device {
            identifiers: vec![format!("omnik_{}", self.logger_id)],
            manufacturer: "Omnik".to_owned(),
            name: format!("Omnik inverter {}", self.logger_id),
            model: "Omnik data logger".to_owned(),
            sw_version: format!("omnik-bridge-{}", CARGO_PKG_VERSION),
        }
    }

    fn sensor(&self, sensor: Sensor, device: &Device) -> Result<mqtt::Message> {
        let unique_id = format!("omnik_{}_{}", self.logger_id, sensor.key());
        let state_topic = self.absolute(&mqtt::Message::state_topic(&self.logger_id, sensor));

        let entity = Entity {
            name: sensor.name(),
            unique_id: unique_id.clone(),
            json_attributes_topic: sensor
                .has_attributes()
                .then(|| format!("{}/attributes", state_topic)),
            state_topic,
            icon: sensor.icon(),
            device_class: sensor.device_class(),
            unit_of_measurement: sensor.unit(),
            state_class: sensor.state_class(),
            suggested_display_precision: sensor.precision(),
            availability_topic: sensor
                .follows_availability()
                .then(|| self.absolute(&mqtt::Message::availability_topic(&self.logger_id))),
            device,
        };

        Ok(mqtt::Message {
            topic: format!(
                "{}/sensor/{}/config",
                self.mqtt_config.homeassistant().prefix(),
                unique_id
            ),
            retain: true,
            payload: serde_json::to_string(&entity)?,
        })
    }

    fn absolute(&self, topic: &str) -> String {
        format!("{}/{}", self.mqtt_config.namespace(), topic)
    }
}
