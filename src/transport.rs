//! Frame dispatch to a byte link
//!
//! The link (serial port, BLE characteristic, socket) is any `std::io::Write`.
//! Frames are written whole, one at a time, and the writer is flushed after
//! each so the firmware sees frame boundaries in arrival order. I/O errors are
//! returned as-is; nothing here retries.
//!
//! Layouts without a delay field cannot carry timing on the wire, so timed
//! patterns are paced on the host instead: commands are grouped by their
//! `delay_ms`, the delay is zeroed, and each group is sent when its offset
//! comes due.

use crate::protocol::{encode_batch, CodecError, CommandCodec, Frame};
use crate::types::LogicalCommand;
use std::io::Write;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Write every frame in order, flushing after each. Returns bytes written.
pub fn dispatch<W: Write + ?Sized>(frames: &[Frame], writer: &mut W) -> std::io::Result<usize> {
    let mut written = 0;
    for (i, frame) in frames.iter().enumerate() {
        writer.write_all(frame.as_bytes())?;
        writer.flush()?;
        written += frame.len();
        trace!(frame = i, bytes = frame.len(), "Frame written");
    }
    Ok(written)
}

/// Commands that share one host-side send time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedBatch {
    /// Offset from pattern start.
    pub at: Duration,
    /// Commands with `delay_ms` zeroed, in their original relative order.
    pub commands: Vec<LogicalCommand>,
}

/// Group commands by `delay_ms` into chronologically ordered batches.
pub fn schedule(commands: &[LogicalCommand]) -> Vec<TimedBatch> {
    let mut sorted: Vec<LogicalCommand> = commands.to_vec();
    sorted.sort_by_key(|c| c.delay_ms);

    let mut batches: Vec<TimedBatch> = Vec::new();
    for cmd in sorted {
        let at = Duration::from_millis(u64::from(cmd.delay_ms));
        let immediate = LogicalCommand { delay_ms: 0, ..cmd };
        match batches.last_mut() {
            Some(batch) if batch.at == at => batch.commands.push(immediate),
            _ => batches.push(TimedBatch {
                at,
                commands: vec![immediate],
            }),
        }
    }
    batches
}

/// Host-paced dispatch: before each batch due later than the previous one,
/// `sleep` is called with the gap between them.
///
/// Each batch is framed and fully written before the next sleep. Returns
/// total bytes written.
pub fn dispatch_paced<W, S>(
    codec: &CommandCodec,
    batches: &[TimedBatch],
    max_frame_bytes: usize,
    writer: &mut W,
    mut sleep: S,
) -> Result<usize, TransportError>
where
    W: Write + ?Sized,
    S: FnMut(Duration),
{
    let mut elapsed = Duration::ZERO;
    let mut written = 0;

    for batch in batches {
        if batch.at > elapsed {
            sleep(batch.at - elapsed);
            elapsed = batch.at;
        }
        let frames = encode_batch(codec, &batch.commands, max_frame_bytes)?;
        written += dispatch(&frames, writer)?;
        debug!(
            at_ms = batch.at.as_millis() as u64,
            commands = batch.commands.len(),
            frames = frames.len(),
            "Paced batch sent"
        );
    }

    Ok(written)
}
