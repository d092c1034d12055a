pub mod frame;
pub mod layout;
pub mod logger;
pub mod payload;

use crate::error::RejectReason;
use frame::ValidatedFrame;
use payload::TelemetryRecord;

/// Result of running a buffer through both stages.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedFrame<'a> {
    pub frame: ValidatedFrame<'a>,
    pub record: TelemetryRecord,
}

impl<'a> DecodedFrame<'a> {
    pub fn logger_id(&self) -> &str {
        &self.record.logger_id
    }

    pub fn raw(&self) -> &'a [u8] {
        self.frame.raw()
    }
}

/// Validates `buffer` and decodes its inverter payload. `strict` additionally
/// checks the checksum and terminator bytes.
pub fn decode_frame(buffer: &[u8], strict: bool) -> Result<DecodedFrame<'_>, RejectReason> {
    let frame = frame::validate_with(buffer, strict)?;
    let readings = payload::decode(frame.payload())?;

    Ok(DecodedFrame {
        record: TelemetryRecord {
            logger_id: frame.logger_id().to_string(),
            readings,
        },
        frame,
    })
}
