//! Wire layout descriptors
//!
//! A descriptor fixes the byte width of one encoded command and the bit
//! position of every field, counted MSB-first from the start of the command.
//! Fields may straddle byte boundaries.
//!
//! Canonical 5-byte layout (40 bits):
//!
//! ```text
//! B0: [addr:7][start:1]
//! B1: [duty:7][freq_hi:1]
//! B2: [freq_lo:4][delay_hi:4]
//! B3: [delay_mid:8]
//! B4: [delay_lo:4][flags:4]
//! ```
//!
//! The legacy layouts predate the delay field and split the address into a
//! serial group and a sub-address on that group's chain. They are separate,
//! non-interchangeable descriptors; one session uses exactly one.

use super::codec::CodecError;
use crate::types::LogicalCommand;
use serde::{Deserialize, Serialize};

/// Logical fields of a command, used to identify range violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandField {
    Address,
    Duty,
    FreqIndex,
    Delay,
    Flags,
}

impl std::fmt::Display for CommandField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandField::Address => write!(f, "address"),
            CommandField::Duty => write!(f, "duty"),
            CommandField::FreqIndex => write!(f, "freq_index"),
            CommandField::Delay => write!(f, "delay_ms"),
            CommandField::Flags => write!(f, "flags"),
        }
    }
}

/// What a run of bits on the wire carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Address,
    /// `address / per_group`
    AddressGroup { per_group: u8 },
    /// `address % per_group`
    AddressSub { per_group: u8 },
    Start,
    Duty,
    FreqIndex,
    Delay,
    Flags,
    /// Fixed bits the firmware uses to resynchronise on byte boundaries.
    Marker { value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// Bit offset from the MSB of the first byte.
    pub offset: u8,
    pub width: u8,
}

impl FieldSpec {
    const fn new(kind: FieldKind, offset: u8, width: u8) -> Self {
        Self { kind, offset, width }
    }

    /// Largest value representable in this field.
    pub const fn max_value(&self) -> u32 {
        (1u32 << self.width) - 1
    }
}

/// Which descriptor a session speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVariant {
    /// 5 bytes: 7-bit address and duty, 5-bit frequency index, 16-bit delay, 4-bit flags.
    #[default]
    Canonical5,
    /// 4 bytes: 8 actuators per group, 5-bit duty, 3-bit frequency, no delay.
    LegacyGrouped4,
    /// 3 bytes with marker bits: 16 actuators per group, 4-bit duty, 3-bit frequency, no delay.
    LegacyMarker3,
}

impl ProtocolVariant {
    pub fn descriptor(self) -> &'static ProtocolDescriptor {
        match self {
            ProtocolVariant::Canonical5 => &CANONICAL5,
            ProtocolVariant::LegacyGrouped4 => &LEGACY_GROUPED4,
            ProtocolVariant::LegacyMarker3 => &LEGACY_MARKER3,
        }
    }
}

impl std::fmt::Display for ProtocolVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.descriptor().name)
    }
}

/// Byte width plus the ordered field list of one wire layout.
///
/// Descriptors are at most 8 bytes wide so a command fits a `u64` accumulator.
#[derive(Debug, PartialEq, Eq)]
pub struct ProtocolDescriptor {
    pub name: &'static str,
    pub width_bytes: usize,
    pub fields: &'static [FieldSpec],
}

pub static CANONICAL5: ProtocolDescriptor = ProtocolDescriptor {
    name: "canonical5",
    width_bytes: 5,
    fields: &[
        FieldSpec::new(FieldKind::Address, 0, 7),
        FieldSpec::new(FieldKind::Start, 7, 1),
        FieldSpec::new(FieldKind::Duty, 8, 7),
        FieldSpec::new(FieldKind::FreqIndex, 15, 5),
        FieldSpec::new(FieldKind::Delay, 20, 16),
        FieldSpec::new(FieldKind::Flags, 36, 4),
    ],
};

// [00][group:4][0][start] [00][sub:6] [000][duty:5] [00000][freq:3]
pub static LEGACY_GROUPED4: ProtocolDescriptor = ProtocolDescriptor {
    name: "legacy_grouped4",
    width_bytes: 4,
    fields: &[
        FieldSpec::new(FieldKind::Marker { value: 0 }, 0, 2),
        FieldSpec::new(FieldKind::AddressGroup { per_group: 8 }, 2, 4),
        FieldSpec::new(FieldKind::Marker { value: 0 }, 6, 1),
        FieldSpec::new(FieldKind::Start, 7, 1),
        FieldSpec::new(FieldKind::Marker { value: 0 }, 8, 2),
        FieldSpec::new(FieldKind::AddressSub { per_group: 8 }, 10, 6),
        FieldSpec::new(FieldKind::Marker { value: 0 }, 16, 3),
        FieldSpec::new(FieldKind::Duty, 19, 5),
        FieldSpec::new(FieldKind::Marker { value: 0 }, 24, 5),
        FieldSpec::new(FieldKind::FreqIndex, 29, 3),
    ],
};

// [000][group:3][0][start] [01][sub:6] [1][duty:4][freq:3]
pub static LEGACY_MARKER3: ProtocolDescriptor = ProtocolDescriptor {
    name: "legacy_marker3",
    width_bytes: 3,
    fields: &[
        FieldSpec::new(FieldKind::Marker { value: 0 }, 0, 3),
        FieldSpec::new(FieldKind::AddressGroup { per_group: 16 }, 3, 3),
        FieldSpec::new(FieldKind::Marker { value: 0 }, 6, 1),
        FieldSpec::new(FieldKind::Start, 7, 1),
        FieldSpec::new(FieldKind::Marker { value: 0b01 }, 8, 2),
        FieldSpec::new(FieldKind::AddressSub { per_group: 16 }, 10, 6),
        FieldSpec::new(FieldKind::Marker { value: 1 }, 16, 1),
        FieldSpec::new(FieldKind::Duty, 17, 4),
        FieldSpec::new(FieldKind::FreqIndex, 21, 3),
    ],
};

impl ProtocolDescriptor {
    pub const fn total_bits(&self) -> u32 {
        (self.width_bytes * 8) as u32
    }

    fn field(&self, wanted: impl Fn(FieldKind) -> bool) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| wanted(f.kind))
    }

    /// Largest encodable address.
    pub fn address_max(&self) -> u32 {
        if let Some(f) = self.field(|k| matches!(k, FieldKind::Address)) {
            return f.max_value();
        }
        match self.field(|k| matches!(k, FieldKind::AddressGroup { .. })) {
            Some(f) => match f.kind {
                FieldKind::AddressGroup { per_group } => {
                    (f.max_value() + 1) * u32::from(per_group) - 1
                }
                _ => 0,
            },
            None => 0,
        }
    }

    pub fn duty_max(&self) -> u32 {
        self.field(|k| matches!(k, FieldKind::Duty))
            .map_or(0, FieldSpec::max_value)
    }

    pub fn freq_index_max(&self) -> u32 {
        self.field(|k| matches!(k, FieldKind::FreqIndex))
            .map_or(0, FieldSpec::max_value)
    }

    /// `None` when the layout has no delay field; only zero delays are then encodable.
    pub fn delay_max(&self) -> Option<u32> {
        self.field(|k| matches!(k, FieldKind::Delay))
            .map(FieldSpec::max_value)
    }

    /// `None` when the layout has no flags field; only zero flags are then encodable.
    pub fn flags_max(&self) -> Option<u32> {
        self.field(|k| matches!(k, FieldKind::Flags))
            .map(FieldSpec::max_value)
    }

    /// Range-check every field of `cmd` against this layout.
    ///
    /// Fails on the first offending field, naming it, its value and the bound.
    pub fn check(&self, cmd: &LogicalCommand) -> Result<(), CodecError> {
        check_range(CommandField::Address, u32::from(cmd.address), self.address_max())?;
        check_range(CommandField::Duty, u32::from(cmd.duty), self.duty_max())?;
        check_range(CommandField::FreqIndex, u32::from(cmd.freq_index), self.freq_index_max())?;
        check_optional(CommandField::Delay, cmd.delay_ms, self.delay_max(), self.name)?;
        check_optional(CommandField::Flags, u32::from(cmd.flags), self.flags_max(), self.name)?;
        Ok(())
    }
}

fn check_range(field: CommandField, value: u32, max: u32) -> Result<(), CodecError> {
    if value > max {
        return Err(CodecError::FieldOutOfRange { field, value, max });
    }
    Ok(())
}

fn check_optional(
    field: CommandField,
    value: u32,
    max: Option<u32>,
    protocol: &'static str,
) -> Result<(), CodecError> {
    match max {
        Some(max) => check_range(field, value, max),
        None if value != 0 => Err(CodecError::UnsupportedField { field, value, protocol }),
        None => Ok(()),
    }
}
