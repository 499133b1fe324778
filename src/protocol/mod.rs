//! Wire protocol: descriptors, command codec, batch framing, frequency and
//! duty quantization.

pub mod codec;
pub mod descriptor;
pub mod duty;
pub mod framer;
pub mod frequency;

pub use codec::{CodecError, CommandCodec};
pub use descriptor::{CommandField, FieldKind, FieldSpec, ProtocolDescriptor, ProtocolVariant};
pub use duty::{duty_to_intensity, intensity_to_duty, DutyError, DutyLevel, DutyScale};
pub use framer::{decode_batch, encode_batch, Frame};
pub use frequency::{FrequencyError, FrequencyTable};
