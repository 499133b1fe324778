//! Command Codec
//!
//! Packs a `LogicalCommand` into the fixed-width byte form of the active
//! descriptor and back. Both directions are exact inverses for every input
//! they accept: `decode(encode(cmd)) == cmd` and `encode(decode(bytes)) == bytes`.

use super::descriptor::{CommandField, FieldKind, FieldSpec, ProtocolDescriptor, ProtocolVariant};
use crate::types::{CommandError, CommandKind, LogicalCommand};
use thiserror::Error;

/// Codec and framing errors. All are local validation failures; none is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("{field} = {value} is out of range (0-{max})")]
    FieldOutOfRange {
        field: CommandField,
        value: u32,
        max: u32,
    },

    #[error("{field} = {value} cannot be encoded: protocol {protocol} has no {field} field")]
    UnsupportedField {
        field: CommandField,
        value: u32,
        protocol: &'static str,
    },

    #[error("Command must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Marker bits at offset {offset} must be {expected:#b}, got {actual:#b}")]
    MarkerMismatch { offset: u8, expected: u32, actual: u32 },

    #[error("Sub-address {value} exceeds the {per_group} actuators per group")]
    SubAddressOutOfRange { value: u32, per_group: u8 },

    #[error("Command list is empty")]
    EmptyBatch,

    #[error("max_frame_bytes = {max_frame_bytes} cannot hold one {command_width}-byte command")]
    FrameTooSmall {
        max_frame_bytes: usize,
        command_width: usize,
    },

    #[error("Frame length {len} is not a multiple of the {command_width}-byte command width")]
    MisalignedFrame { len: usize, command_width: usize },

    #[error("Decoded command is incomplete: {0}")]
    Incomplete(#[from] CommandError),

    #[error("Error in command {index}: {source}")]
    InBatch {
        index: usize,
        #[source]
        source: Box<CodecError>,
    },
}

/// Encoder/decoder bound to one protocol descriptor for the whole session.
#[derive(Debug, Clone, Copy)]
pub struct CommandCodec {
    descriptor: &'static ProtocolDescriptor,
}

impl CommandCodec {
    pub fn new(variant: ProtocolVariant) -> Self {
        Self {
            descriptor: variant.descriptor(),
        }
    }

    pub fn descriptor(&self) -> &'static ProtocolDescriptor {
        self.descriptor
    }

    /// Bytes per encoded command.
    pub fn command_width(&self) -> usize {
        self.descriptor.width_bytes
    }

    pub fn encode(&self, cmd: &LogicalCommand) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.command_width());
        self.encode_into(cmd, &mut out)?;
        Ok(out)
    }

    /// Append the encoded command to `out`. Nothing is written on error.
    pub fn encode_into(&self, cmd: &LogicalCommand, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.descriptor.check(cmd)?;

        let address = u32::from(cmd.address);
        let mut bits = 0u64;
        for field in self.descriptor.fields {
            let value = match field.kind {
                FieldKind::Address => address,
                FieldKind::AddressGroup { per_group } => address / u32::from(per_group),
                FieldKind::AddressSub { per_group } => address % u32::from(per_group),
                FieldKind::Start => u32::from(cmd.kind.bit()),
                FieldKind::Duty => u32::from(cmd.duty),
                FieldKind::FreqIndex => u32::from(cmd.freq_index),
                FieldKind::Delay => cmd.delay_ms,
                FieldKind::Flags => u32::from(cmd.flags),
                FieldKind::Marker { value } => u32::from(value),
            };
            bits |= self.place(field, value);
        }

        let be = bits.to_be_bytes();
        out.extend_from_slice(&be[be.len() - self.command_width()..]);
        Ok(())
    }

    /// Decode exactly one command. The input length must equal the command width.
    pub fn decode(&self, bytes: &[u8]) -> Result<LogicalCommand, CodecError> {
        let width = self.command_width();
        if bytes.len() != width {
            return Err(CodecError::InvalidLength {
                expected: width,
                actual: bytes.len(),
            });
        }

        let bits = bytes
            .iter()
            .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));

        let mut builder = LogicalCommand::builder();
        let mut address = 0u32;
        for field in self.descriptor.fields {
            let value = self.extract(field, bits);
            match field.kind {
                FieldKind::Address => address = value,
                FieldKind::AddressGroup { per_group } => address += value * u32::from(per_group),
                FieldKind::AddressSub { per_group } => {
                    if value >= u32::from(per_group) {
                        return Err(CodecError::SubAddressOutOfRange { value, per_group });
                    }
                    address += value;
                }
                FieldKind::Start => builder = builder.kind(CommandKind::from_bit(value == 1)),
                FieldKind::Duty => builder = builder.duty(narrow(CommandField::Duty, value)?),
                FieldKind::FreqIndex => {
                    builder = builder.freq_index(narrow(CommandField::FreqIndex, value)?);
                }
                FieldKind::Delay => builder = builder.delay_ms(value),
                FieldKind::Flags => builder = builder.flags(narrow(CommandField::Flags, value)?),
                FieldKind::Marker { value: expected } => {
                    if value != u32::from(expected) {
                        return Err(CodecError::MarkerMismatch {
                            offset: field.offset,
                            expected: u32::from(expected),
                            actual: value,
                        });
                    }
                }
            }
        }
        Ok(builder
            .address(narrow(CommandField::Address, address)?)
            .build()?)
    }

    fn shift(&self, field: &FieldSpec) -> u32 {
        self.descriptor.total_bits() - u32::from(field.offset) - u32::from(field.width)
    }

    fn place(&self, field: &FieldSpec, value: u32) -> u64 {
        (u64::from(value) & u64::from(field.max_value())) << self.shift(field)
    }

    fn extract(&self, field: &FieldSpec, bits: u64) -> u32 {
        // Masked to at most 16 bits, so the narrowing cannot truncate.
        ((bits >> self.shift(field)) & u64::from(field.max_value())) as u32
    }
}

fn narrow(field: CommandField, value: u32) -> Result<u8, CodecError> {
    u8::try_from(value).map_err(|_| CodecError::FieldOutOfRange {
        field,
        value,
        max: u32::from(u8::MAX),
    })
}
