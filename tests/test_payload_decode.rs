mod common;
use common::*;
use omnik_bridge::error::RejectReason;
use omnik_bridge::omnik::{self, layout, payload};

#[test]
fn scales_sixteen_bit_fields() {
    let mut p = Factory::payload();
    Factory::set(&mut p, layout::TEMPERATURE, 0x009e);
    Factory::set(&mut p, layout::ENERGY_TODAY, 0x2d09);
    Factory::set(&mut p, layout::FREQUENCY_AC1, 5002);
    Factory::set(&mut p, layout::POWER_AC1, 1234);

    let r = payload::decode(&p).unwrap();
    assert_eq!(r.temperature, 15.8);
    assert_eq!(r.energy_today, 115.29);
    assert_eq!(r.ac[0].frequency, 50.02);
    assert_eq!(r.power, 1234.0);
    assert_eq!(r.ac[0].power, 1234.0);
}

#[test]
fn fields_are_big_endian() {
    let mut p = Factory::payload();
    p[layout::TEMPERATURE.offset] = 0x00;
    p[layout::TEMPERATURE.offset + 1] = 0x9e;
    assert_eq!(payload::decode(&p).unwrap().temperature, 15.8);

    p[layout::TEMPERATURE.offset] = 0x9e;
    p[layout::TEMPERATURE.offset + 1] = 0x00;
    assert_eq!(payload::decode(&p).unwrap().temperature, 4044.8);
}

#[test]
fn scales_thirty_two_bit_fields() {
    let mut p = Factory::payload();
    // 0x0001e240 = 123456
    Factory::set(&mut p, layout::ENERGY_TOTAL, 0x0001_e240);
    Factory::set(&mut p, layout::OPERATING_HOURS, 70_000);

    let r = payload::decode(&p).unwrap();
    assert_eq!(r.energy_total, 12345.6);
    assert_eq!(r.operating_hours, 70000.0);
}

#[test]
fn all_lines_are_decoded() {
    let mut p = Factory::payload();
    Factory::set(&mut p, layout::VOLTAGE_PV2, 1500);
    Factory::set(&mut p, layout::CURRENT_PV3, 25);
    Factory::set(&mut p, layout::VOLTAGE_AC3, 2310);
    Factory::set(&mut p, layout::POWER_AC2, 300);
    Factory::set(&mut p, layout::FREQUENCY_AC3, 4998);

    let r = payload::decode(&p).unwrap();
    assert_eq!(r.pv[1].voltage, 150.0);
    assert_eq!(r.pv[2].current, 2.5);
    assert_eq!(r.ac[2].voltage, 231.0);
    assert_eq!(r.ac[1].power, 300.0);
    assert_eq!(r.ac[2].frequency, 49.98);
    // the power sensor is line 1 only
    assert_eq!(r.power, 0.0);
}

#[test]
fn attributes_mirror_first_string_and_line() {
    let r = omnik::decode_frame(&Factory::inverter_frame(LOGGER_ID), false)
        .unwrap()
        .record
        .readings;

    assert_eq!(r.attributes.voltage_pv1, 220.6);
    assert_eq!(r.attributes.current_pv1, 1.1);
    assert_eq!(r.attributes.current_ac1, 0.8);
    assert_eq!(r.attributes.voltage_ac1, 234.9);
    assert_eq!(r.attributes.frequency_ac1, 50.02);
}

#[test]
fn read_field_matches_decode() {
    let mut p = Factory::payload();
    Factory::set(&mut p, layout::CURRENT_AC2, 42);

    assert_eq!(payload::read_field(&p, layout::CURRENT_AC2), Ok(4.2));
    assert_eq!(
        payload::read_field(&p[..layout::CURRENT_AC2.offset + 1], layout::CURRENT_AC2),
        Err(RejectReason::PayloadTooShortForRecord {
            len: layout::CURRENT_AC2.offset + 1,
            required: layout::INVERTER_PAYLOAD_SIZE
        })
    );
}

#[test]
fn decoding_is_idempotent() {
    let buffer = Factory::inverter_frame(LOGGER_ID);

    let first = omnik::decode_frame(&buffer, true).unwrap();
    let second = omnik::decode_frame(&buffer, true).unwrap();
    assert_eq!(first, second);

    let a = serde_json::to_string(&first.record).unwrap();
    let b = serde_json::to_string(&second.record).unwrap();
    assert_eq!(a, b);
}

#[test]
fn payload_size_boundary() {
    let p = Factory::payload();
    assert_eq!(p.len(), layout::INVERTER_PAYLOAD_SIZE);
    assert!(payload::decode(&p).is_ok());

    let short = &p[..layout::INVERTER_PAYLOAD_SIZE - 1];
    assert_eq!(
        payload::decode(short),
        Err(RejectReason::PayloadTooShortForRecord {
            len: layout::INVERTER_PAYLOAD_SIZE - 1,
            required: layout::INVERTER_PAYLOAD_SIZE
        })
    );

    // same through a complete frame
    let buffer = Factory::frame(LOGGER_ID, short);
    assert!(matches!(
        omnik::decode_frame(&buffer, true),
        Err(RejectReason::PayloadTooShortForRecord { .. })
    ));
}

#[test]
fn longer_payloads_are_accepted() {
    let mut p = Factory::payload();
    p.extend_from_slice(&[0xff; 20]);
    Factory::set(&mut p, layout::OPERATING_HOURS, 12);

    let r = payload::decode(&p).unwrap();
    assert_eq!(r.operating_hours, 12.0);
}

#[test]
fn inverter_id_stops_at_nul() {
    let p = Factory::payload_with_id(b"NLDN3020\0garbage");
    assert_eq!(payload::decode(&p).unwrap().inverter_id, "NLDN3020");
}

#[test]
fn inverter_id_is_bounded_to_field_width() {
    // no NUL anywhere in the field, and the temperature right after it is non-zero
    let mut p = Factory::payload_with_id(&[b'A'; layout::INVERTER_ID_WIDTH]);
    Factory::set(&mut p, layout::TEMPERATURE, 0x4142);

    let id = payload::decode(&p).unwrap().inverter_id;
    assert_eq!(id, "A".repeat(layout::INVERTER_ID_WIDTH));
}

#[test]
fn inverter_id_with_filler_bytes() {
    let mut field = [0x30u8; layout::INVERTER_ID_WIDTH];
    field[4] = 0x01;
    field[9] = 0xff;
    let mut p = Factory::payload_with_id(&field);
    Factory::set(&mut p, layout::TEMPERATURE, 0x3031);

    let id = payload::decode(&p).unwrap().inverter_id;
    // 0xff is replaced, never dropped or merged with the next field
    assert_eq!(id.chars().count(), layout::INVERTER_ID_WIDTH);
    assert!(id.starts_with("0000\u{1}"));
    assert!(id.ends_with("000000"));
    assert!(!id.contains('1'));
}

#[test]
fn all_ones_is_a_value() {
    let mut p = Factory::payload();
    Factory::set(&mut p, layout::VOLTAGE_PV3, 0xffff);
    assert_eq!(payload::decode(&p).unwrap().pv[2].voltage, 6553.5);
}
