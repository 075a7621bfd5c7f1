//! Decode facades: one-shot into a flat buffer, and a buffered decoder
//! that owns its dictionary and copies produced bytes out.

use vassago_core::{Decompressor, Error, Result, StreamingDecompressor};

use crate::decoder::Lzma2Decoder;
use crate::dict::DictView;
use crate::lzma::{FinishMode, Status};

/// One-shot decode of an LZMA2 chunk stream (no leading property byte)
/// into `dest`, which doubles as the dictionary.
///
/// Returns `(bytes_written, bytes_consumed, status)`. Because the output
/// buffer is the dictionary and is never wrapped, it must be at least as
/// large as the decoded stream.
pub fn lzma2_decode(
    dest: &mut [u8],
    src: &[u8],
    prop: u8,
    finish: FinishMode,
) -> Result<(usize, usize, Status)> {
    let limit = dest.len();
    let mut decoder = Lzma2Decoder::new(prop)?;
    let mut dic = DictView::new(dest);
    let (consumed, status) = decoder.decode_to_dic(&mut dic, limit, src, finish)?;
    Ok((dic.pos, consumed, status))
}

/// Incremental LZMA2 decoder with an internal dictionary.
///
/// Owns a window of exactly the stream's dictionary size. Each call treats
/// the window as a ring: the cursor wraps to zero at the window edge (before
/// decoding, after the previous call's copy-out) and newly produced bytes
/// are copied to the caller's destination.
#[derive(Debug)]
pub struct Lzma2BufDecoder {
    decoder: Lzma2Decoder,
    dict: Vec<u8>,
    dic_pos: usize,
    finished: bool,
}

impl Lzma2BufDecoder {
    /// Create a decoder and allocate its dictionary from the stream
    /// property byte. Fails with [`Error::AllocationFailed`] instead of
    /// aborting when the host cannot provide the window (property byte 40
    /// asks for 4 GiB).
    pub fn new(prop: u8) -> Result<Self> {
        let decoder = Lzma2Decoder::new(prop)?;
        let size = decoder.dic_size() as usize;
        let mut dict = Vec::new();
        dict.try_reserve_exact(size)
            .map_err(|_| Error::allocation_failed(size))?;
        dict.resize(size, 0);
        Ok(Self {
            decoder,
            dict,
            dic_pos: 0,
            finished: false,
        })
    }

    /// Reinitialize to the post-construction state without reallocating.
    pub fn reset(&mut self) {
        self.decoder.reset();
        self.dic_pos = 0;
        self.finished = false;
    }

    /// Decode into `dest`, consuming a prefix of `src`.
    ///
    /// Returns `(bytes_written, bytes_consumed, status)`. Loops internally
    /// until the destination is full or no forward progress is possible, so
    /// a short return with a non-terminal status means more input is needed
    /// or the stream paused at its end.
    pub fn decode_to_buf(
        &mut self,
        dest: &mut [u8],
        src: &[u8],
        finish: FinishMode,
    ) -> Result<(usize, usize, Status)> {
        let mut dest_pos = 0usize;
        let mut src_pos = 0usize;
        loop {
            if self.dic_pos == self.dict.len() {
                self.dic_pos = 0;
            }
            let dic_pos = self.dic_pos;
            let out_room = dest.len() - dest_pos;
            let (out_cur, cur_finish) = if out_room > self.dict.len() - dic_pos {
                (self.dict.len(), FinishMode::Any)
            } else {
                (dic_pos + out_room, finish)
            };
            let mut dic = DictView::with_pos(&mut self.dict, dic_pos);
            let (consumed, status) =
                self.decoder
                    .decode_to_dic(&mut dic, out_cur, &src[src_pos..], cur_finish)?;
            self.dic_pos = dic.pos;
            src_pos += consumed;
            let produced = self.dic_pos - dic_pos;
            dest[dest_pos..dest_pos + produced]
                .copy_from_slice(&self.dict[dic_pos..self.dic_pos]);
            dest_pos += produced;
            if status == Status::FinishedWithMark {
                self.finished = true;
            }
            if produced == 0 || dest_pos == dest.len() {
                return Ok((dest_pos, src_pos, status));
            }
        }
    }
}

impl StreamingDecompressor for Lzma2BufDecoder {
    fn begin(&mut self) -> Result<()> {
        self.reset();
        Ok(())
    }

    fn decompress_chunk(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize, bool)> {
        let (written, read, status) = self.decode_to_buf(output, input, FinishMode::Any)?;
        Ok((read, written, status == Status::FinishedWithMark))
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn reset(&mut self) {
        Lzma2BufDecoder::reset(self);
    }
}

/// One-shot decoder over a complete stream: the leading byte is the stream
/// property byte, the rest the chunk sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lzma2Decompressor;

impl Lzma2Decompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Decompressor for Lzma2Decompressor {
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let (&prop, body) = input
            .split_first()
            .ok_or_else(|| Error::corrupted("missing stream property byte"))?;
        let mut decoder = Lzma2BufDecoder::new(prop)?;
        let mut out = Vec::new();
        let mut buf = vec![0u8; 64 * 1024];
        let mut src_pos = 0usize;
        loop {
            let (written, read, status) =
                decoder.decode_to_buf(&mut buf, &body[src_pos..], FinishMode::Any)?;
            src_pos += read;
            out.extend_from_slice(&buf[..written]);
            match status {
                Status::FinishedWithMark => return Ok(out),
                Status::NeedsMoreInput => return Err(Error::corrupted("stream truncated")),
                _ if written == 0 => return Err(Error::corrupted("stream truncated")),
                _ => {}
            }
        }
    }

    fn decompress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize> {
        let (&prop, body) = input
            .split_first()
            .ok_or_else(|| Error::corrupted("missing stream property byte"))?;
        let provided = output.len();
        let (written, _consumed, status) = lzma2_decode(output, body, prop, FinishMode::End)?;
        match status {
            Status::FinishedWithMark => Ok(written),
            Status::NeedsMoreInput => Err(Error::corrupted("stream truncated")),
            Status::NotFinished | Status::MaybeFinishedWithoutMark => {
                Err(Error::buffer_too_small(written + 1, provided))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO: &[u8] = &[0x01, 0x00, 0x04, b'h', b'e', b'l', b'l', b'o', 0x00];

    #[test]
    fn test_one_shot_decode() {
        let mut out = [0u8; 16];
        let (written, consumed, status) =
            lzma2_decode(&mut out, HELLO, 0x18, FinishMode::End).unwrap();
        assert_eq!(&out[..written], b"hello");
        assert_eq!(consumed, HELLO.len());
        assert_eq!(status, Status::FinishedWithMark);
    }

    #[test]
    fn test_buffered_decode() {
        let mut decoder = Lzma2BufDecoder::new(0).unwrap();
        let mut out = [0u8; 16];
        let (written, read, status) =
            decoder.decode_to_buf(&mut out, HELLO, FinishMode::Any).unwrap();
        assert_eq!(&out[..written], b"hello");
        assert_eq!(read, HELLO.len());
        assert_eq!(status, Status::FinishedWithMark);
        assert!(decoder.finished);
    }

    #[test]
    fn test_streaming_trait_surface() {
        let mut decoder = Lzma2BufDecoder::new(0).unwrap();
        let mut out = [0u8; 16];
        let (read, written, finished) = decoder.decompress_chunk(HELLO, &mut out).unwrap();
        assert_eq!((read, written, finished), (HELLO.len(), 5, true));
        assert!(decoder.is_finished());
        decoder.begin().unwrap();
        assert!(!decoder.is_finished());
    }

    #[test]
    fn test_decompressor_trait_with_leading_prop() {
        let mut stream = vec![0x18u8];
        stream.extend_from_slice(HELLO);
        let out = Lzma2Decompressor::new().decompress(&stream).unwrap();
        assert_eq!(out, b"hello");

        let mut buf = [0u8; 8];
        let n = Lzma2Decompressor::new()
            .decompress_to(&stream, &mut buf)
            .unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_decompress_rejects_truncation() {
        let mut stream = vec![0x18u8];
        stream.extend_from_slice(&HELLO[..4]);
        let err = Lzma2Decompressor::new().decompress(&stream).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }
}
