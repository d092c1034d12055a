use thiserror::Error;

/// Why a candidate buffer was refused. Every variant is an expected outcome for
/// noisy input; callers decide whether it is worth logging.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    #[error("buffer of {len} bytes is too short for a frame header")]
    TooShortForHeader { len: usize },

    #[error("unknown start byte {found:#04x}, expecting 0x68")]
    BadStartByte { found: u8 },

    #[error("buffer of {len} bytes is too short, header declares {required}")]
    TooShortForDeclaredPayload { len: usize, required: usize },

    #[error("logger id mismatch in header ({primary} <-> {secondary})")]
    LoggerIdMismatch { primary: u32, secondary: u32 },

    #[error("payload of {len} bytes is too short for an inverter record ({required} needed)")]
    PayloadTooShortForRecord { len: usize, required: usize },

    #[error("checksum mismatch: frame carries {actual:#04x}, computed {expected:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    #[error("unknown terminator byte {found:#04x}, expecting 0x16")]
    BadTerminator { found: u8 },
}

impl RejectReason {
    /// Short stable name, used as a statistics key.
    pub fn kind(&self) -> &'static str {
        use RejectReason::*;

        match self {
            TooShortForHeader { .. } => "too_short_for_header",
            BadStartByte { .. } => "bad_start_byte",
            TooShortForDeclaredPayload { .. } => "too_short_for_declared_payload",
            LoggerIdMismatch { .. } => "logger_id_mismatch",
            PayloadTooShortForRecord { .. } => "payload_too_short_for_record",
            ChecksumMismatch { .. } => "checksum_mismatch",
            BadTerminator { .. } => "bad_terminator",
        }
    }
}
