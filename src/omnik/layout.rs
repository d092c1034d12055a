// Byte layout of an Omnik logger frame.
//
//   frame   = header | payload | checksum | terminator
//   header  = 0x68 | payload_len | msg_type(2) | logger_id(4, LE) | logger_id(4, LE)
//   payload = skip(3) | inverter_id(16) | telemetry fields (BE)
//
// The checksum is the sum of every byte from payload_len up to the end of the
// payload, truncated to 8 bits.

pub const START_BYTE: u8 = 0x68;
pub const TERMINATOR: u8 = 0x16;

pub const HEADER_SIZE: usize = 12;
// checksum + terminator
pub const TRAILER_SIZE: usize = 2;

pub const PAYLOAD_LENGTH_OFFSET: usize = 1;

pub const INVERTER_ID_OFFSET: usize = 3;
pub const INVERTER_ID_WIDTH: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    U16,
    U32,
}

impl Width {
    pub const fn bytes(self) -> usize {
        match self {
            Width::U16 => 2,
            Width::U32 => 4,
        }
    }
}

/// One big-endian numeric field of the inverter payload. The wire value is an
/// unsigned integer; the real value is `raw / divisor`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub offset: usize,
    pub width: Width,
    pub divisor: f64,
}

impl Field {
    const fn new(name: &'static str, offset: usize, width: Width, divisor: f64) -> Self {
        Self {
            name,
            offset,
            width,
            divisor,
        }
    }

    pub const fn end(&self) -> usize {
        self.offset + self.width.bytes()
    }
}

pub const TEMPERATURE: Field = Field::new("temperature", 19, Width::U16, 10.0);

pub const VOLTAGE_PV1: Field = Field::new("voltage_pv1", 21, Width::U16, 10.0);
pub const VOLTAGE_PV2: Field = Field::new("voltage_pv2", 23, Width::U16, 10.0);
pub const VOLTAGE_PV3: Field = Field::new("voltage_pv3", 25, Width::U16, 10.0);
pub const CURRENT_PV1: Field = Field::new("current_pv1", 27, Width::U16, 10.0);
pub const CURRENT_PV2: Field = Field::new("current_pv2", 29, Width::U16, 10.0);
pub const CURRENT_PV3: Field = Field::new("current_pv3", 31, Width::U16, 10.0);

pub const CURRENT_AC1: Field = Field::new("current_ac1", 33, Width::U16, 10.0);
pub const CURRENT_AC2: Field = Field::new("current_ac2", 35, Width::U16, 10.0);
pub const CURRENT_AC3: Field = Field::new("current_ac3", 37, Width::U16, 10.0);
pub const VOLTAGE_AC1: Field = Field::new("voltage_ac1", 39, Width::U16, 10.0);
pub const VOLTAGE_AC2: Field = Field::new("voltage_ac2", 41, Width::U16, 10.0);
pub const VOLTAGE_AC3: Field = Field::new("voltage_ac3", 43, Width::U16, 10.0);

// frequency and power are interleaved per AC line
pub const FREQUENCY_AC1: Field = Field::new("frequency_ac1", 45, Width::U16, 100.0);
pub const POWER_AC1: Field = Field::new("power_ac1", 47, Width::U16, 1.0);
pub const FREQUENCY_AC2: Field = Field::new("frequency_ac2", 49, Width::U16, 100.0);
pub const POWER_AC2: Field = Field::new("power_ac2", 51, Width::U16, 1.0);
pub const FREQUENCY_AC3: Field = Field::new("frequency_ac3", 53, Width::U16, 100.0);
pub const POWER_AC3: Field = Field::new("power_ac3", 55, Width::U16, 1.0);

pub const ENERGY_TODAY: Field = Field::new("energy_today", 57, Width::U16, 100.0);
pub const ENERGY_TOTAL: Field = Field::new("energy_total", 59, Width::U32, 10.0);
pub const OPERATING_HOURS: Field = Field::new("operating_hours", 63, Width::U32, 1.0);

/// Every numeric field, in wire order.
pub const FIELDS: [Field; 22] = [
    TEMPERATURE,
    VOLTAGE_PV1,
    VOLTAGE_PV2,
    VOLTAGE_PV3,
    CURRENT_PV1,
    CURRENT_PV2,
    CURRENT_PV3,
    CURRENT_AC1,
    CURRENT_AC2,
    CURRENT_AC3,
    VOLTAGE_AC1,
    VOLTAGE_AC2,
    VOLTAGE_AC3,
    FREQUENCY_AC1,
    POWER_AC1,
    FREQUENCY_AC2,
    POWER_AC2,
    FREQUENCY_AC3,
    POWER_AC3,
    ENERGY_TODAY,
    ENERGY_TOTAL,
    OPERATING_HOURS,
];

/// Bytes of payload needed to decode a complete inverter record.
pub const INVERTER_PAYLOAD_SIZE: usize = OPERATING_HOURS.end();
