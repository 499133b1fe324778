//! Batch Framer
//!
//! Packs encoded commands into size-bounded frames for the link. A command
//! never straddles two frames, and concatenating every frame reproduces the
//! input commands in order.

use super::codec::{CodecError, CommandCodec};
use crate::types::LogicalCommand;
use tracing::debug;

/// Immutable byte payload for one write to the link.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(Vec<u8>);

impl Frame {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Lowercase hex, two digits per byte, no separators.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

/// Split a command list into frames of at most `max_frame_bytes` bytes.
///
/// Every command is range-checked before any frame is produced, so an
/// out-of-range command anywhere in the list yields no output at all.
pub fn encode_batch(
    codec: &CommandCodec,
    commands: &[LogicalCommand],
    max_frame_bytes: usize,
) -> Result<Vec<Frame>, CodecError> {
    if commands.is_empty() {
        return Err(CodecError::EmptyBatch);
    }

    let width = codec.command_width();
    let per_frame = max_frame_bytes / width;
    if per_frame == 0 {
        return Err(CodecError::FrameTooSmall {
            max_frame_bytes,
            command_width: width,
        });
    }

    for (index, cmd) in commands.iter().enumerate() {
        codec
            .descriptor()
            .check(cmd)
            .map_err(|e| CodecError::InBatch {
                index,
                source: Box::new(e),
            })?;
    }

    let mut frames = Vec::with_capacity(commands.len().div_ceil(per_frame));
    for (chunk_no, chunk) in commands.chunks(per_frame).enumerate() {
        let mut bytes = Vec::with_capacity(chunk.len() * width);
        for (i, cmd) in chunk.iter().enumerate() {
            codec
                .encode_into(cmd, &mut bytes)
                .map_err(|e| CodecError::InBatch {
                    index: chunk_no * per_frame + i,
                    source: Box::new(e),
                })?;
        }
        frames.push(Frame(bytes));
    }

    debug!(
        protocol = codec.descriptor().name,
        commands = commands.len(),
        frames = frames.len(),
        max_frame_bytes = max_frame_bytes,
        "Encoded command batch"
    );

    Ok(frames)
}

/// Decode every command in one frame. The frame length must be a whole
/// multiple of the command width.
pub fn decode_batch(codec: &CommandCodec, frame: &[u8]) -> Result<Vec<LogicalCommand>, CodecError> {
    let width = codec.command_width();
    if frame.len() % width != 0 {
        return Err(CodecError::MisalignedFrame {
            len: frame.len(),
            command_width: width,
        });
    }

    frame
        .chunks_exact(width)
        .enumerate()
        .map(|(index, bytes)| {
            codec.decode(bytes).map_err(|e| CodecError::InBatch {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}
