//! The LZMA2 framing state machine.
//!
//! Drives the entropy core chunk by chunk: parses control and size bytes,
//! applies the per-chunk reset discipline (dictionary, state, properties),
//! copies uncompressed chunks straight into the dictionary, and hands
//! compressed payloads to [`LzmaCore`] bounded by the chunk's pack and
//! unpack sizes.

use tracing::{debug, trace};
use vassago_core::{Error, Result};

use crate::chunk::{self, ChunkState};
use crate::dict::DictView;
use crate::lzma::{FinishMode, LzmaCore, Status};
use crate::props::{self, Properties, LC_PLUS_LP_MAX};

/// An incremental LZMA2 decoder over a caller-supplied dictionary.
///
/// Created from the stream-level property byte, which fixes the dictionary
/// size. The caller owns the dictionary memory and passes it to every call
/// as a [`DictView`]; when the view's cursor reaches its size, the caller
/// copies the produced bytes out and wraps the cursor to zero. See
/// [`Lzma2BufDecoder`](crate::Lzma2BufDecoder) for a facade that does this
/// bookkeeping internally.
#[derive(Debug)]
pub struct Lzma2Decoder {
    core: LzmaCore,
    state: ChunkState,
    control: u8,
    pack_size: usize,
    unpack_size: usize,
    need_init_dic: bool,
    need_init_state: bool,
    need_init_prop: bool,
}

impl Lzma2Decoder {
    /// Create a decoder from the stream property byte (`0..=40`).
    pub fn new(prop: u8) -> Result<Self> {
        let dic_size = props::dic_size_from_prop(prop)?;
        let mut decoder = Self {
            core: LzmaCore::new(Properties {
                lc: LC_PLUS_LP_MAX,
                lp: 0,
                pb: 0,
                dic_size,
            }),
            state: ChunkState::Control,
            control: 0,
            pack_size: 0,
            unpack_size: 0,
            need_init_dic: true,
            need_init_state: true,
            need_init_prop: true,
        };
        decoder.reset();
        Ok(decoder)
    }

    /// Reinitialize to the post-construction state without reallocating.
    ///
    /// The caller's dictionary cursor is not touched here; rewind it before
    /// the next call.
    pub fn reset(&mut self) {
        self.state = ChunkState::Control;
        self.need_init_dic = true;
        self.need_init_state = true;
        self.need_init_prop = true;
        self.core.init_dic_and_state(true, true);
    }

    /// The properties currently in effect (dictionary size is fixed at
    /// construction; `lc`/`lp`/`pb` follow per-chunk reloads).
    pub fn properties(&self) -> &Properties {
        &self.core.props
    }

    /// Dictionary size derived from the stream property byte.
    pub fn dic_size(&self) -> u32 {
        self.core.props.dic_size
    }

    /// Decode incrementally: advance `dic.pos` up to `dic_limit`, consuming
    /// a prefix of `src`. Returns bytes consumed and the status.
    ///
    /// After the end-of-stream control byte the decoder is finished for
    /// good: further calls return [`Status::FinishedWithMark`] without
    /// consuming anything. Corruption is fatal; discard or [`reset`] the
    /// decoder after an error.
    ///
    /// [`reset`]: Lzma2Decoder::reset
    pub fn decode_to_dic(
        &mut self,
        dic: &mut DictView<'_>,
        dic_limit: usize,
        src: &[u8],
        finish: FinishMode,
    ) -> Result<(usize, Status)> {
        debug_assert!(dic.pos <= dic_limit && dic_limit <= dic.size());
        let in_size = src.len();
        let mut src_len = 0usize;

        while self.state != ChunkState::Finished {
            let dic_pos = dic.pos;
            if dic_pos == dic_limit && finish == FinishMode::Any {
                return Ok((src_len, Status::NotFinished));
            }

            if self.state != ChunkState::Data && self.state != ChunkState::DataCont {
                if src_len == in_size {
                    return Ok((src_len, Status::NeedsMoreInput));
                }
                let b = src[src_len];
                src_len += 1;
                self.state = self.update_state(b)?;
                continue;
            }

            let mut dest_size_cur = dic_limit - dic_pos;
            let mut src_size_cur = in_size - src_len;
            let mut cur_finish = FinishMode::Any;
            if self.unpack_size <= dest_size_cur {
                dest_size_cur = self.unpack_size;
                cur_finish = FinishMode::End;
            }

            if chunk::is_uncompressed(self.control) {
                if src_len == in_size {
                    return Ok((src_len, Status::NeedsMoreInput));
                }
                if self.state == ChunkState::Data {
                    let init_dic = self.control == chunk::CONTROL_COPY_RESET_DIC;
                    if init_dic {
                        self.need_init_prop = true;
                        self.need_init_state = true;
                    } else if self.need_init_dic {
                        return Err(Error::corrupted(
                            "first chunk must reset the dictionary",
                        ));
                    }
                    self.need_init_dic = false;
                    self.core.init_dic_and_state(init_dic, false);
                }
                if src_size_cur > dest_size_cur {
                    src_size_cur = dest_size_cur;
                }
                if src_size_cur == 0 {
                    return Err(Error::corrupted("empty uncompressed chunk payload"));
                }
                trace!(len = src_size_cur, "copying uncompressed chunk bytes");
                self.core
                    .update_with_uncompressed(dic, &src[src_len..src_len + src_size_cur]);
                src_len += src_size_cur;
                self.unpack_size -= src_size_cur;
                self.state = if self.unpack_size == 0 {
                    ChunkState::Control
                } else {
                    ChunkState::DataCont
                };
            } else {
                if self.state == ChunkState::Data {
                    let mode = chunk::lzma_mode(self.control);
                    let init_dic = mode == 3;
                    let init_state = mode > 0;
                    if (!init_dic && self.need_init_dic) || (!init_state && self.need_init_state) {
                        return Err(Error::corrupted(
                            "chunk continues state that was never initialized",
                        ));
                    }
                    trace!(
                        control = self.control,
                        unpack = self.unpack_size,
                        pack = self.pack_size,
                        "starting lzma chunk"
                    );
                    self.core.init_dic_and_state(init_dic, init_state);
                    self.need_init_dic = false;
                    self.need_init_state = false;
                    self.state = ChunkState::DataCont;
                }
                if src_size_cur > self.pack_size {
                    src_size_cur = self.pack_size;
                }
                let (consumed, status) = self.core.decode_to_dic(
                    dic,
                    dic_pos + dest_size_cur,
                    &src[src_len..src_len + src_size_cur],
                    cur_finish,
                )?;
                src_len += consumed;
                self.pack_size -= consumed;
                let out_processed = dic.pos - dic_pos;
                self.unpack_size -= out_processed;

                if status == Status::NeedsMoreInput {
                    return Ok((src_len, Status::NeedsMoreInput));
                }
                if consumed == 0 && out_processed == 0 {
                    if status != Status::MaybeFinishedWithoutMark
                        || self.unpack_size != 0
                        || self.pack_size != 0
                    {
                        return Err(Error::corrupted(
                            "chunk sizes disagree with decoded payload",
                        ));
                    }
                    self.state = ChunkState::Control;
                }
            }
        }

        debug!(consumed = src_len, "stream finished");
        Ok((src_len, Status::FinishedWithMark))
    }

    /// Consume one header byte and step the chunk state machine.
    fn update_state(&mut self, b: u8) -> Result<ChunkState> {
        match self.state {
            ChunkState::Control => {
                self.control = b;
                if b == chunk::CONTROL_EOS {
                    return Ok(ChunkState::Finished);
                }
                if chunk::is_uncompressed(b) {
                    if (b & 0x7F) > chunk::CONTROL_COPY_NO_RESET {
                        return Err(Error::corrupted(format!("invalid control byte {b:#04x}")));
                    }
                    self.unpack_size = 0;
                } else {
                    self.unpack_size = usize::from(b & 0x1F) << 16;
                }
                Ok(ChunkState::Unpack0)
            }
            ChunkState::Unpack0 => {
                self.unpack_size |= usize::from(b) << 8;
                Ok(ChunkState::Unpack1)
            }
            ChunkState::Unpack1 => {
                self.unpack_size |= usize::from(b);
                self.unpack_size += 1;
                if chunk::is_uncompressed(self.control) {
                    Ok(ChunkState::Data)
                } else {
                    Ok(ChunkState::Pack0)
                }
            }
            ChunkState::Pack0 => {
                self.pack_size = usize::from(b) << 8;
                Ok(ChunkState::Pack1)
            }
            ChunkState::Pack1 => {
                self.pack_size |= usize::from(b);
                self.pack_size += 1;
                if chunk::has_new_props(chunk::lzma_mode(self.control)) {
                    Ok(ChunkState::Prop)
                } else if self.need_init_prop {
                    Err(Error::corrupted("chunk needs properties that were never set"))
                } else {
                    Ok(ChunkState::Data)
                }
            }
            ChunkState::Prop => {
                let (lc, lp, pb) = props::parse_lzma_props(b)?;
                debug!(lc, lp, pb, "reloading chunk properties");
                self.core.set_props(lc, lp, pb);
                self.need_init_prop = false;
                Ok(ChunkState::Data)
            }
            ChunkState::Data | ChunkState::DataCont | ChunkState::Finished => {
                Err(Error::corrupted("unexpected header byte"))
            }
        }
    }
}
