//! Shared helpers for the integration suite: fixture streams, the
//! deterministic test-data generator, and incremental drive loops.
//!
//! The `.lzma2` fixtures start with the stream property byte; `.bin` files
//! hold the expected plain bytes. They were produced by an encoder harness
//! cross-checked against the reference decoder (this crate ships no
//! encoder).
#![allow(dead_code)]

use vassago_lzma2::{FinishMode, Lzma2BufDecoder, Status};

pub const LCG_LITERALS: &[u8] = include_bytes!("../data/lcg_literals.lzma2");
pub const MIXED_OPS: &[u8] = include_bytes!("../data/mixed_ops.lzma2");
pub const MIXED_OPS_PLAIN: &[u8] = include_bytes!("../data/mixed_ops.bin");
pub const PROPS_SWITCH: &[u8] = include_bytes!("../data/props_switch.lzma2");
pub const PROPS_SWITCH_PLAIN: &[u8] = include_bytes!("../data/props_switch.bin");
pub const COPY_THEN_LZMA: &[u8] = include_bytes!("../data/copy_then_lzma.lzma2");
pub const COPY_THEN_LZMA_PLAIN: &[u8] = include_bytes!("../data/copy_then_lzma.bin");
pub const EMBEDDED_END_MARKER: &[u8] = include_bytes!("../data/embedded_end_marker.lzma2");
pub const WRAP: &[u8] = include_bytes!("../data/wrap.lzma2");
pub const WRAP_PLAIN: &[u8] = include_bytes!("../data/wrap.bin");

/// The linear congruential generator the original test corpus is built on.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new() -> Self {
        Self { state: u64::MAX }
    }

    pub fn next_byte(&mut self) -> u8 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u8
    }
}

pub fn lcg_bytes(n: usize) -> Vec<u8> {
    let mut lcg = Lcg::new();
    (0..n).map(|_| lcg.next_byte()).collect()
}

/// Split a fixture into its property byte and chunk body.
pub fn split_stream(stream: &[u8]) -> (u8, &[u8]) {
    (stream[0], &stream[1..])
}

/// Wrap plain data in uncompressed LZMA2 chunks of at most `chunk` bytes
/// (first chunk resets the dictionary) and terminate the stream.
pub fn build_copy_stream(data: &[u8], chunk: usize) -> Vec<u8> {
    assert!(!data.is_empty() && chunk >= 1 && chunk <= 1 << 16);
    let mut out = Vec::with_capacity(data.len() + data.len() / chunk * 3 + 4);
    for (i, part) in data.chunks(chunk).enumerate() {
        let size = part.len() - 1;
        out.push(if i == 0 { 0x01 } else { 0x02 });
        out.push((size >> 8) as u8);
        out.push(size as u8);
        out.extend_from_slice(part);
    }
    out.push(0x00);
    out
}

/// Decode a complete fixture through the buffered facade in one call.
pub fn decode_buffered(stream: &[u8], cap: usize) -> (Vec<u8>, Status) {
    let (prop, body) = split_stream(stream);
    let mut decoder = Lzma2BufDecoder::new(prop).unwrap();
    let mut out = vec![0u8; cap];
    let (written, _read, status) = decoder
        .decode_to_buf(&mut out, body, FinishMode::Any)
        .unwrap();
    out.truncate(written);
    (out, status)
}

/// Decode a fixture feeding the body in pieces of `chunk` bytes. A piece
/// that makes no progress is widened, mirroring how a real caller would
/// top up its read buffer on `NeedsMoreInput`.
pub fn decode_in_pieces(stream: &[u8], chunk: usize, cap: usize) -> (Vec<u8>, Status) {
    let (prop, body) = split_stream(stream);
    let mut decoder = Lzma2BufDecoder::new(prop).unwrap();
    let mut out = Vec::new();
    let mut buf = vec![0u8; cap.max(64)];
    let mut fed = 0usize;
    let mut status = Status::NotFinished;
    while fed < body.len() {
        let mut end = (fed + chunk).min(body.len());
        loop {
            let (written, read, s) = decoder
                .decode_to_buf(&mut buf, &body[fed..end], FinishMode::Any)
                .unwrap();
            out.extend_from_slice(&buf[..written]);
            status = s;
            if read > 0 || s == Status::FinishedWithMark {
                fed += read;
                break;
            }
            assert!(end < body.len(), "decoder stalled before end of stream");
            end = (end + chunk).min(body.len());
        }
        if status == Status::FinishedWithMark {
            break;
        }
    }
    (out, status)
}
