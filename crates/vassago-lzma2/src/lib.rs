//! # Vassago LZMA2
//!
//! Native Rust decoder for the LZMA2 compressed byte stream: the chunked
//! container framing interleaved with the LZMA range-coded entropy decoder.
//! Given a stream of input bytes and a single property byte, the decoder
//! reproduces the original byte sequence, detecting corruption and
//! end-of-stream. There is no encoder and no I/O: callers pump byte slices
//! in and read decoded bytes out of a dictionary window.
//!
//! ## Quick Start
//!
//! ```
//! use vassago_lzma2::{lzma2_decode, FinishMode, Status};
//!
//! // property byte 0x18; one uncompressed chunk holding "test_str"
//! let src = [0x01, 0x00, 0x07, b't', b'e', b's', b't', b'_', b's', b't', b'r', 0x00];
//! let mut out = [0u8; 16];
//! let (written, _consumed, status) =
//!     lzma2_decode(&mut out, &src, 0x18, FinishMode::End).unwrap();
//! assert_eq!(&out[..written], b"test_str");
//! assert_eq!(status, Status::FinishedWithMark);
//! ```
//!
//! For streams larger than memory, [`Lzma2BufDecoder`] owns a dictionary of
//! exactly the stream's window size and decodes incrementally; the
//! lower-level [`Lzma2Decoder`] leaves the dictionary in the caller's hands.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     vassago-lzma2                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  decompress.rs   one-shot + buffered facades             │
//! │  decoder.rs      LZMA2 chunk framing state machine       │
//! ├──────────────────────────────────────────────────────────┤
//! │  lzma.rs         range decoder, symbol loop, probe       │
//! │  probs.rs        adaptive probability model layout       │
//! ├──────────────────────────────────────────────────────────┤
//! │  chunk.rs        control bytes    props.rs   properties  │
//! │  dict.rs         dictionary view                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stream format
//!
//! `stream = property_byte || chunk*`. The property byte (0..=40) fixes the
//! dictionary size. Each chunk opens with a control byte selecting between
//! end-of-stream, uncompressed payloads and LZMA payloads with graded reset
//! semantics; sizes are big-endian 16-bit fields biased by one. There is no
//! checksum at this layer.
//!
//! Decoding is strictly single-threaded and allocation happens only at
//! construction: the probability table, plus (for the buffered facade) the
//! dictionary itself.

mod chunk;
pub mod decoder;
pub mod decompress;
pub mod dict;
pub mod lzma;
mod probs;
pub mod props;

pub use decoder::Lzma2Decoder;
pub use decompress::{lzma2_decode, Lzma2BufDecoder, Lzma2Decompressor};
pub use dict::DictView;
pub use lzma::{FinishMode, Status};
pub use props::{dic_size_from_prop, Properties, MAX_PROP_BYTE};

// Re-exported so downstream users don't need a direct vassago-core dependency
// for the common surface.
pub use vassago_core::{Decompressor, Error, Result, StreamingDecompressor};
