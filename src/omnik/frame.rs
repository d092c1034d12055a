use crate::error::RejectReason;
use crate::omnik::layout::{
    HEADER_SIZE, PAYLOAD_LENGTH_OFFSET, START_BYTE, TERMINATOR, TRAILER_SIZE,
};

use nom_derive::{Nom, Parse};

// FrameHeader {{{
#[derive(Clone, Copy, Debug, PartialEq, Eq, Nom)]
#[nom(LittleEndian)]
pub struct FrameHeader {
    pub start: u8,
    pub payload_length: u8,
    pub msg_type: u16, // opaque, never interpreted
    pub logger_id_primary: u32,
    pub logger_id_secondary: u32,
}

impl FrameHeader {
    pub fn msg_type_bytes(&self) -> [u8; 2] {
        self.msg_type.to_le_bytes()
    }

    /// Total frame length the header claims, trailer included.
    pub fn frame_length(&self) -> usize {
        HEADER_SIZE + self.payload_length as usize + TRAILER_SIZE
    }
} // }}}

// ValidatedFrame {{{
/// A buffer that passed the structural checks. Borrows the caller's buffer;
/// nothing is copied or modified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValidatedFrame<'a> {
    raw: &'a [u8],
    header: FrameHeader,
    payload: &'a [u8],
}

impl<'a> ValidatedFrame<'a> {
    pub fn header(&self) -> &FrameHeader {
        &self.header
    }

    pub fn logger_id(&self) -> u32 {
        self.header.logger_id_primary
    }

    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// The whole buffer as handed in, including anything after this frame.
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    fn trailer_offset(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    pub fn checksum(&self) -> u8 {
        self.raw[self.trailer_offset()]
    }

    pub fn terminator(&self) -> u8 {
        self.raw[self.trailer_offset() + 1]
    }

    pub fn computed_checksum(&self) -> u8 {
        self.raw[PAYLOAD_LENGTH_OFFSET..self.trailer_offset()]
            .iter()
            .fold(0u8, |sum, b| sum.wrapping_add(*b))
    }

    pub fn verify_trailer(&self) -> Result<(), RejectReason> {
        let expected = self.computed_checksum();
        let actual = self.checksum();
        if expected != actual {
            return Err(RejectReason::ChecksumMismatch { expected, actual });
        }

        if self.terminator() != TERMINATOR {
            return Err(RejectReason::BadTerminator {
                found: self.terminator(),
            });
        }

        Ok(())
    }
} // }}}

/// Structural validation of one candidate buffer. Checks run in a fixed order
/// and the first failure is returned; the trailer bytes are not inspected.
pub fn validate(buffer: &[u8]) -> Result<ValidatedFrame<'_>, RejectReason> {
    let len = buffer.len();
    if len < HEADER_SIZE {
        return Err(RejectReason::TooShortForHeader { len });
    }

    let (_, header) =
        FrameHeader::parse(buffer).map_err(|_| RejectReason::TooShortForHeader { len })?;

    if header.start != START_BYTE {
        return Err(RejectReason::BadStartByte {
            found: header.start,
        });
    }

    let required = header.frame_length();
    if len < required {
        return Err(RejectReason::TooShortForDeclaredPayload { len, required });
    }

    if header.logger_id_primary != header.logger_id_secondary {
        return Err(RejectReason::LoggerIdMismatch {
            primary: header.logger_id_primary,
            secondary: header.logger_id_secondary,
        });
    }

    let payload = buffer
        .get(HEADER_SIZE..HEADER_SIZE + header.payload_length as usize)
        .ok_or(RejectReason::TooShortForDeclaredPayload { len, required })?;

    Ok(ValidatedFrame {
        raw: buffer,
        header,
        payload,
    })
}

/// As [`validate`], then also requires a matching checksum and a 0x16 terminator.
pub fn validate_strict(buffer: &[u8]) -> Result<ValidatedFrame<'_>, RejectReason> {
    let frame = validate(buffer)?;
    frame.verify_trailer()?;
    Ok(frame)
}

pub fn validate_with(buffer: &[u8], strict: bool) -> Result<ValidatedFrame<'_>, RejectReason> {
    if strict {
        validate_strict(buffer)
    } else {
        validate(buffer)
    }
}
