#![allow(dead_code)]

use omnik_bridge::config::{self, Config, ConfigWrapper};
use omnik_bridge::omnik::layout::{self, Field, Width};

pub const LOGGER_ID: u32 = 601680011;
pub const INVERTER_ID: &str = "NLDN302013P00001";

// a real inverter report, as received from a logger
pub const CAPTURE: [u8; 99] = [
    0x68, 0x55, 0x41, 0xb0, 0x8b, 0xe8, 0xdc, 0x23, 0x8b, 0xe8, 0xdc, 0x23,
    0x81, 0x02, 0x01, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30,
    0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x30, 0x01, 0x3d, 0x08, 0x9e, 0x00,
    0x00, 0xff, 0xff, 0x00, 0x0b, 0x00, 0xb4, 0xff, 0xff, 0x00, 0x08, 0xff,
    0xff, 0xff, 0xff, 0x09, 0x2d, 0xff, 0xff, 0xff, 0xff, 0x13, 0x8a, 0x00,
    0xd1, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x03, 0x30, 0x00,
    0x00, 0x00, 0x51, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x01, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x76, 0x16,
];

// "DATA SEND IS OK", sent by the same logger after the report above
pub const CAPTURE_ACK: [u8; 29] = [
    0x68, 0x0f, 0x41, 0xf0, 0x8b, 0xe8, 0xdc, 0x23, 0x8b, 0xe8, 0xdc, 0x23,
    0x44, 0x41, 0x54, 0x41, 0x20, 0x53, 0x45, 0x4e, 0x44, 0x20, 0x49, 0x53,
    0x20, 0x4f, 0x4b, 0xfe, 0x16,
];

pub struct Factory();
impl Factory {
    /// A complete frame around `payload`, with a correct checksum and terminator.
    pub fn frame(logger_id: u32, payload: &[u8]) -> Vec<u8> {
        Self::frame_with_ids(logger_id, logger_id, payload)
    }

    pub fn frame_with_ids(primary: u32, secondary: u32, payload: &[u8]) -> Vec<u8> {
        let mut r = vec![layout::START_BYTE, payload.len() as u8, 0x41, 0xb0];
        r.extend_from_slice(&primary.to_le_bytes());
        r.extend_from_slice(&secondary.to_le_bytes());
        r.extend_from_slice(payload);

        let checksum = r[1..].iter().fold(0u8, |sum, b| sum.wrapping_add(*b));
        r.push(checksum);
        r.push(layout::TERMINATOR);
        r
    }

    /// A payload of exactly the inverter record size, all fields zero.
    pub fn payload() -> Vec<u8> {
        Self::payload_with_id(INVERTER_ID.as_bytes())
    }

    pub fn payload_with_id(inverter_id: &[u8]) -> Vec<u8> {
        let mut r = vec![0u8; layout::INVERTER_PAYLOAD_SIZE];
        r[..3].copy_from_slice(&[0x81, 0x02, 0x01]);
        let width = inverter_id.len().min(layout::INVERTER_ID_WIDTH);
        r[layout::INVERTER_ID_OFFSET..layout::INVERTER_ID_OFFSET + width]
            .copy_from_slice(&inverter_id[..width]);
        r
    }

    /// Writes a raw big-endian value into the field's slot.
    pub fn set(payload: &mut [u8], field: Field, raw: u32) {
        let slot = &mut payload[field.offset..field.end()];
        match field.width {
            Width::U16 => slot.copy_from_slice(&(raw as u16).to_be_bytes()),
            Width::U32 => slot.copy_from_slice(&raw.to_be_bytes()),
        }
    }

    /// A frame carrying a typical daytime reading.
    pub fn inverter_frame(logger_id: u32) -> Vec<u8> {
        let mut payload = Self::payload();
        Self::set(&mut payload, layout::TEMPERATURE, 317);
        Self::set(&mut payload, layout::VOLTAGE_PV1, 2206);
        Self::set(&mut payload, layout::CURRENT_PV1, 11);
        Self::set(&mut payload, layout::CURRENT_AC1, 8);
        Self::set(&mut payload, layout::VOLTAGE_AC1, 2349);
        Self::set(&mut payload, layout::FREQUENCY_AC1, 5002);
        Self::set(&mut payload, layout::POWER_AC1, 209);
        Self::set(&mut payload, layout::ENERGY_TODAY, 816);
        Self::set(&mut payload, layout::ENERGY_TOTAL, 81);
        Self::set(&mut payload, layout::OPERATING_HOURS, 10);
        Self::frame(logger_id, &payload)
    }

    pub fn config() -> Config {
        Config::from_yaml(
            r#"
mqtt:
  host: localhost
  namespace: solar
"#,
        )
        .expect("factory config")
    }

    pub fn config_wrapper() -> ConfigWrapper {
        ConfigWrapper::from_config(Self::config())
    }

    pub fn mqtt_config() -> config::Mqtt {
        Self::config().mqtt
    }
}
