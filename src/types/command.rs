//! Logical actuator commands
//!
//! A `LogicalCommand` is the strongly-typed record every pattern compiler
//! emits and the codec consumes. Values are protocol-scoped integers; range
//! checks against a concrete wire layout happen in
//! [`ProtocolDescriptor::check`](crate::protocol::ProtocolDescriptor::check).

use super::layout::ActuatorId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Whether a command switches its actuator on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Start,
    Stop,
}

impl CommandKind {
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::Start
        } else {
            Self::Stop
        }
    }

    pub const fn bit(self) -> bool {
        matches!(self, Self::Start)
    }
}

/// One time-stamped activation change for a single actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogicalCommand {
    pub address: ActuatorId,
    pub kind: CommandKind,
    pub duty: u8,
    pub freq_index: u8,
    /// Delay relative to pattern start.
    pub delay_ms: u32,
    pub flags: u8,
}

impl LogicalCommand {
    pub const fn start(address: ActuatorId, duty: u8, freq_index: u8, delay_ms: u32) -> Self {
        Self {
            address,
            kind: CommandKind::Start,
            duty,
            freq_index,
            delay_ms,
            flags: 0,
        }
    }

    /// Stop commands carry zero duty and frequency; the firmware ignores both.
    pub const fn stop(address: ActuatorId, delay_ms: u32) -> Self {
        Self {
            address,
            kind: CommandKind::Stop,
            duty: 0,
            freq_index: 0,
            delay_ms,
            flags: 0,
        }
    }

    pub const fn with_flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub const fn is_start(&self) -> bool {
        matches!(self.kind, CommandKind::Start)
    }

    pub fn builder() -> CommandBuilder {
        CommandBuilder::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Command is missing required field '{0}'")]
    MissingField(&'static str),
}

/// Validating constructor for commands assembled field by field. The codec
/// decodes wire bytes through it, so a descriptor missing the start bit is
/// reported instead of silently producing a stop.
///
/// `address` and `kind` are required. A start command also requires `duty`;
/// everything else defaults to zero.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    address: Option<ActuatorId>,
    kind: Option<CommandKind>,
    duty: Option<u8>,
    freq_index: u8,
    delay_ms: u32,
    flags: u8,
}

impl CommandBuilder {
    pub fn address(mut self, address: ActuatorId) -> Self {
        self.address = Some(address);
        self
    }

    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn duty(mut self, duty: u8) -> Self {
        self.duty = Some(duty);
        self
    }

    pub fn freq_index(mut self, freq_index: u8) -> Self {
        self.freq_index = freq_index;
        self
    }

    pub fn delay_ms(mut self, delay_ms: u32) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self) -> Result<LogicalCommand, CommandError> {
        let address = self.address.ok_or(CommandError::MissingField("address"))?;
        let kind = self.kind.ok_or(CommandError::MissingField("kind"))?;
        let duty = match (kind, self.duty) {
            (_, Some(duty)) => duty,
            (CommandKind::Stop, None) => 0,
            (CommandKind::Start, None) => return Err(CommandError::MissingField("duty")),
        };

        Ok(LogicalCommand {
            address,
            kind,
            duty,
            freq_index: self.freq_index,
            delay_ms: self.delay_ms,
            flags: self.flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let cmd = LogicalCommand::builder()
            .address(9)
            .kind(CommandKind::Stop)
            .build()
            .unwrap();
        assert_eq!(cmd, LogicalCommand::stop(9, 0));
    }

    #[test]
    fn test_builder_requires_address() {
        let err = LogicalCommand::builder().kind(CommandKind::Stop).build();
        assert_eq!(err, Err(CommandError::MissingField("address")));
    }

    #[test]
    fn test_builder_start_requires_duty() {
        let err = LogicalCommand::builder()
            .address(1)
            .kind(CommandKind::Start)
            .build();
        assert_eq!(err, Err(CommandError::MissingField("duty")));
    }

    #[test]
    fn test_builder_full() {
        let cmd = LogicalCommand::builder()
            .address(3)
            .kind(CommandKind::Start)
            .duty(64)
            .freq_index(12)
            .delay_ms(250)
            .flags(2)
            .build()
            .unwrap();
        assert_eq!(cmd, LogicalCommand::start(3, 64, 12, 250).with_flags(2));
    }

    #[test]
    fn test_kind_bit_mapping() {
        assert_eq!(CommandKind::from_bit(true), CommandKind::Start);
        assert!(!CommandKind::Stop.bit());
    }
}
