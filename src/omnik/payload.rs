use crate::error::RejectReason;
use crate::omnik::layout::{self, Field, Width, INVERTER_ID_OFFSET, INVERTER_ID_WIDTH, INVERTER_PAYLOAD_SIZE};

use nom::number::complete::{be_u16, be_u32};
use serde::Serialize;

/// Readings published as attributes of the inverter id; first PV string and
/// first AC line only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExtendedAttributes {
    pub voltage_pv1: f64,
    pub current_pv1: f64,
    pub current_ac1: f64,
    pub voltage_ac1: f64,
    pub frequency_ac1: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PvInput {
    pub voltage: f64,
    pub current: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AcLine {
    pub voltage: f64,
    pub current: f64,
    pub frequency: f64,
    pub power: f64,
}

/// Everything the inverter payload carries, already scaled.
///
/// `power` is AC line 1; it is the single representative reading the bridge
/// publishes as the power sensor. All three lines are kept in `ac` for the
/// full telemetry document.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InverterReadings {
    pub inverter_id: String,
    pub temperature: f64,
    pub power: f64,
    pub energy_today: f64,
    pub energy_total: f64,
    pub operating_hours: f64,
    pub attributes: ExtendedAttributes,
    pub pv: [PvInput; 3],
    pub ac: [AcLine; 3],
}

/// Decoded frame content handed to the publishing side.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub logger_id: String,
    #[serde(flatten)]
    pub readings: InverterReadings,
}

pub fn decode(payload: &[u8]) -> Result<InverterReadings, RejectReason> {
    if payload.len() < INVERTER_PAYLOAD_SIZE {
        return Err(too_short(payload));
    }

    let read = |field: Field| read_field(payload, field);

    let pv = [
        PvInput {
            voltage: read(layout::VOLTAGE_PV1)?,
            current: read(layout::CURRENT_PV1)?,
        },
        PvInput {
            voltage: read(layout::VOLTAGE_PV2)?,
            current: read(layout::CURRENT_PV2)?,
        },
        PvInput {
            voltage: read(layout::VOLTAGE_PV3)?,
            current: read(layout::CURRENT_PV3)?,
        },
    ];

    let ac = [
        AcLine {
            voltage: read(layout::VOLTAGE_AC1)?,
            current: read(layout::CURRENT_AC1)?,
            frequency: read(layout::FREQUENCY_AC1)?,
            power: read(layout::POWER_AC1)?,
        },
        AcLine {
            voltage: read(layout::VOLTAGE_AC2)?,
            current: read(layout::CURRENT_AC2)?,
            frequency: read(layout::FREQUENCY_AC2)?,
            power: read(layout::POWER_AC2)?,
        },
        AcLine {
            voltage: read(layout::VOLTAGE_AC3)?,
            current: read(layout::CURRENT_AC3)?,
            frequency: read(layout::FREQUENCY_AC3)?,
            power: read(layout::POWER_AC3)?,
        },
    ];

    let attributes = ExtendedAttributes {
        voltage_pv1: pv[0].voltage,
        current_pv1: pv[0].current,
        current_ac1: ac[0].current,
        voltage_ac1: ac[0].voltage,
        frequency_ac1: ac[0].frequency,
    };

    Ok(InverterReadings {
        inverter_id: inverter_id(payload)?,
        temperature: read(layout::TEMPERATURE)?,
        power: ac[0].power,
        energy_today: read(layout::ENERGY_TODAY)?,
        energy_total: read(layout::ENERGY_TOTAL)?,
        operating_hours: read(layout::OPERATING_HOURS)?,
        attributes,
        pv,
        ac,
    })
}

/// Reads one numeric field and applies its divisor.
pub fn read_field(payload: &[u8], field: Field) -> Result<f64, RejectReason> {
    let bytes = payload
        .get(field.offset..field.end())
        .ok_or_else(|| too_short(payload))?;

    let raw = match field.width {
        Width::U16 => be_u16::<_, nom::error::Error<&[u8]>>(bytes).map(|(_, v)| u32::from(v)),
        Width::U32 => be_u32::<_, nom::error::Error<&[u8]>>(bytes).map(|(_, v)| v),
    }
    .map_err(|_| too_short(payload))?;

    Ok(f64::from(raw) / field.divisor)
}

// the wire field is not guaranteed to be NUL terminated; stop at the first NUL
// or at the field width, whichever comes first
fn inverter_id(payload: &[u8]) -> Result<String, RejectReason> {
    let field = payload
        .get(INVERTER_ID_OFFSET..INVERTER_ID_OFFSET + INVERTER_ID_WIDTH)
        .ok_or_else(|| too_short(payload))?;

    let mut id = [0u8; INVERTER_ID_WIDTH];
    id.copy_from_slice(field);

    let end = id.iter().position(|b| *b == 0).unwrap_or(INVERTER_ID_WIDTH);

    Ok(String::from_utf8_lossy(&id[..end]).into_owned())
}

fn too_short(payload: &[u8]) -> RejectReason {
    RejectReason::PayloadTooShortForRecord {
        len: payload.len(),
        required: INVERTER_PAYLOAD_SIZE,
    }
}
