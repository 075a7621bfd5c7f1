//! LZMA entropy core: range decoder, probability model, match emission.
//!
//! The hot path lives in [`LzmaCore::decode_real`], a single flat loop over
//! local copies of the range-coder registers. A tiny [`RangeDecoder`] borrows
//! that state mutably for the individual bit operations; its read-only twin
//! [`ProbeDecoder`] re-runs a symbol decode against a snapshot without
//! touching the probability table, which is how truncated input is detected
//! before any state is committed.

use vassago_core::{Error, Result};

use crate::dict::DictView;
use crate::probs::*;
use crate::props::Properties;

/// Worst-case compressed bytes consumed by a single LZMA symbol.
pub(crate) const REQUIRED_INPUT_MAX: usize = 20;

/// Range-coder priming prefix: one zero byte plus four code bytes.
pub(crate) const RC_INIT_SIZE: usize = 5;

/// Caller assertion about where the output limit falls.
///
/// `End` means the stream must be finished once the limit is reached and the
/// decoder will insist on seeing the end marker (or a cleanly drained range
/// coder) there; `Any` means the limit is just a pause point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishMode {
    /// Stop whenever the output limit is hit.
    Any,
    /// The output limit is the exact end of the stream.
    End,
}

/// Outcome of a decode call that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The end-of-stream mark was decoded and the range coder drained.
    FinishedWithMark,
    /// The output limit was reached with work still pending.
    NotFinished,
    /// Input ran out mid-symbol; resume with more bytes.
    NeedsMoreInput,
    /// The output limit was reached and the stream may end here, but no
    /// explicit mark was seen.
    MaybeFinishedWithoutMark,
}

/// Result of a side-effect-free symbol probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Probe {
    Lit,
    Match,
    Rep,
}

/// Mutable range-coder state for a decode pass, borrowed from the core.
struct RangeDecoder<'a> {
    range: u32,
    code: u32,
    buf: &'a [u8],
    pos: usize,
}

impl RangeDecoder<'_> {
    #[inline]
    fn normalize(&mut self) {
        if self.range < TOP_VALUE {
            self.range <<= 8;
            self.code = (self.code << 8) | u32::from(self.buf[self.pos]);
            self.pos += 1;
        }
    }

    #[inline]
    fn decode_bit(&mut self, prob: &mut u16) -> u32 {
        self.normalize();
        let p = u32::from(*prob);
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * p;
        if self.code < bound {
            self.range = bound;
            *prob = (p + ((BIT_MODEL_TOTAL - p) >> NUM_MOVE_BITS)) as u16;
            0
        } else {
            self.range -= bound;
            self.code -= bound;
            *prob = (p - (p >> NUM_MOVE_BITS)) as u16;
            1
        }
    }

    /// One raw bit, no probability model.
    #[inline]
    fn decode_direct_bit(&mut self) -> u32 {
        self.normalize();
        self.range >>= 1;
        if self.code >= self.range {
            self.code -= self.range;
            1
        } else {
            0
        }
    }

    /// MSB-first bit-tree decode over `probs[1..]`, yielding a symbol in
    /// `0..(1 << num_bits)`.
    #[inline]
    fn tree_decode(&mut self, probs: &mut [u16], num_bits: u32) -> usize {
        let mut m = 1usize;
        for _ in 0..num_bits {
            m = (m << 1) | self.decode_bit(&mut probs[m]) as usize;
        }
        m - (1 << num_bits)
    }

    /// LSB-first bit-tree decode, used for the low distance bits.
    #[inline]
    fn reverse_tree_decode(&mut self, probs: &mut [u16], num_bits: u32) -> u32 {
        let mut m = 1usize;
        let mut sym = 0u32;
        for i in 0..num_bits {
            let b = self.decode_bit(&mut probs[m]);
            m = (m << 1) | b as usize;
            sym |= b << i;
        }
        sym
    }
}

/// Read-only twin of [`RangeDecoder`]: same arithmetic, no probability
/// updates, and every input read is bounds-checked so truncation surfaces
/// as `None` instead of a decode.
struct ProbeDecoder<'a> {
    range: u32,
    code: u32,
    buf: &'a [u8],
    pos: usize,
}

impl ProbeDecoder<'_> {
    #[inline]
    fn normalize(&mut self) -> Option<()> {
        if self.range < TOP_VALUE {
            if self.pos >= self.buf.len() {
                return None;
            }
            self.range <<= 8;
            self.code = (self.code << 8) | u32::from(self.buf[self.pos]);
            self.pos += 1;
        }
        Some(())
    }

    #[inline]
    fn decode_bit(&mut self, prob: u16) -> Option<u32> {
        self.normalize()?;
        let bound = (self.range >> NUM_BIT_MODEL_TOTAL_BITS) * u32::from(prob);
        if self.code < bound {
            self.range = bound;
            Some(0)
        } else {
            self.range -= bound;
            self.code -= bound;
            Some(1)
        }
    }

    #[inline]
    fn decode_direct_bit(&mut self) -> Option<()> {
        self.normalize()?;
        self.range >>= 1;
        if self.code >= self.range {
            self.code -= self.range;
        }
        Some(())
    }
}

/// The LZMA decoder state: probability table, literal/match state, repeat
/// distances, range-coder registers and the small input carry buffer.
///
/// The dictionary is not owned here; every operation takes a [`DictView`]
/// so the framing layer and facades decide where output lives.
#[derive(Debug)]
pub(crate) struct LzmaCore {
    pub(crate) props: Properties,
    probs: Probs,
    state: usize,
    reps: [u32; 4],
    range: u32,
    code: u32,
    processed_pos: u32,
    check_dic_size: u32,
    remain_len: usize,
    need_flush: bool,
    need_init_state: bool,
    temp_buf: [u8; REQUIRED_INPUT_MAX],
    temp_buf_size: usize,
}

impl LzmaCore {
    pub(crate) fn new(props: Properties) -> Self {
        Self {
            props,
            probs: Probs::new(props.lc + props.lp),
            state: 0,
            reps: [1; 4],
            range: 0,
            code: 0,
            processed_pos: 0,
            check_dic_size: 0,
            remain_len: 0,
            need_flush: true,
            need_init_state: true,
            temp_buf: [0; REQUIRED_INPUT_MAX],
            temp_buf_size: 0,
        }
    }

    /// Replace the literal/position properties (per-chunk reload).
    ///
    /// The probability table is sized for the LZMA2 maximum `lc + lp` at
    /// construction, so no reallocation happens here.
    pub(crate) fn set_props(&mut self, lc: u32, lp: u32, pb: u32) {
        self.props.lc = lc;
        self.props.lp = lp;
        self.props.pb = pb;
    }

    /// Schedule resets for the next decode call. `init_dic` forgets all
    /// window history; either flag defers a full state reset (probabilities,
    /// repeat distances, literal/match state) to the decode path.
    pub(crate) fn init_dic_and_state(&mut self, init_dic: bool, init_state: bool) {
        self.need_flush = true;
        self.remain_len = 0;
        self.temp_buf_size = 0;
        if init_dic {
            self.processed_pos = 0;
            self.check_dic_size = 0;
            self.need_init_state = true;
        }
        if init_state {
            self.need_init_state = true;
        }
    }

    fn reset_state(&mut self) {
        let num_probs = LITERAL + (LIT_SIZE << (self.props.lc + self.props.lp));
        self.probs.reset(num_probs);
        self.reps = [1; 4];
        self.state = 0;
        self.need_init_state = false;
    }

    /// Append verbatim bytes from an uncompressed chunk.
    pub(crate) fn update_with_uncompressed(&mut self, dic: &mut DictView<'_>, src: &[u8]) {
        dic.mem[dic.pos..dic.pos + src.len()].copy_from_slice(src);
        dic.pos += src.len();
        if self.check_dic_size == 0
            && (self.props.dic_size - self.processed_pos) as usize <= src.len()
        {
            self.check_dic_size = self.props.dic_size;
        }
        self.processed_pos = self.processed_pos.wrapping_add(src.len() as u32);
    }

    /// Decode into the dictionary up to `dic_limit`, consuming a prefix of
    /// `src`. Returns bytes consumed and the resulting status.
    pub(crate) fn decode_to_dic(
        &mut self,
        dic: &mut DictView<'_>,
        dic_limit: usize,
        src: &[u8],
        finish: FinishMode,
    ) -> Result<(usize, Status)> {
        let in_size = src.len();
        let mut src_len = 0usize;
        self.write_rem(dic, dic_limit);

        while self.remain_len != MATCH_SPEC_LEN_START {
            if self.need_flush {
                while src_len < in_size && self.temp_buf_size < RC_INIT_SIZE {
                    self.temp_buf[self.temp_buf_size] = src[src_len];
                    self.temp_buf_size += 1;
                    src_len += 1;
                }
                if self.temp_buf_size < RC_INIT_SIZE {
                    return Ok((src_len, Status::NeedsMoreInput));
                }
                if self.temp_buf[0] != 0 {
                    return Err(Error::corrupted("nonzero leading range coder byte"));
                }
                self.code = u32::from_be_bytes([
                    self.temp_buf[1],
                    self.temp_buf[2],
                    self.temp_buf[3],
                    self.temp_buf[4],
                ]);
                self.range = u32::MAX;
                self.need_flush = false;
                self.temp_buf_size = 0;
            }

            let mut check_end_mark_now = false;
            if dic.pos >= dic_limit {
                if self.remain_len == 0 && self.code == 0 {
                    return Ok((src_len, Status::MaybeFinishedWithoutMark));
                }
                if finish == FinishMode::Any {
                    return Ok((src_len, Status::NotFinished));
                }
                if self.remain_len != 0 {
                    return Err(Error::corrupted("match still pending at output limit"));
                }
                check_end_mark_now = true;
            }

            if self.need_init_state {
                self.reset_state();
            }

            if self.temp_buf_size == 0 {
                let rest = &src[src_len..];
                let buf_limit;
                if rest.len() < REQUIRED_INPUT_MAX || check_end_mark_now {
                    match self.try_dummy(dic, rest) {
                        None => {
                            self.temp_buf[..rest.len()].copy_from_slice(rest);
                            self.temp_buf_size = rest.len();
                            return Ok((in_size, Status::NeedsMoreInput));
                        }
                        Some(probe) => {
                            if check_end_mark_now && probe != Probe::Match {
                                return Err(Error::corrupted(
                                    "expected end marker at output limit",
                                ));
                            }
                        }
                    }
                    buf_limit = 0;
                } else {
                    buf_limit = rest.len() - REQUIRED_INPUT_MAX;
                }
                let processed = self.decode_real2(dic, dic_limit, rest, buf_limit)?;
                src_len += processed;
            } else {
                // Refill the carry buffer, run one symbol out of it, then
                // credit back whatever look-ahead was not actually consumed.
                let mut rem = self.temp_buf_size;
                let mut look_ahead = 0usize;
                while rem < REQUIRED_INPUT_MAX && src_len + look_ahead < in_size {
                    self.temp_buf[rem] = src[src_len + look_ahead];
                    rem += 1;
                    look_ahead += 1;
                }
                self.temp_buf_size = rem;
                if rem < REQUIRED_INPUT_MAX || check_end_mark_now {
                    match self.try_dummy(dic, &self.temp_buf[..rem]) {
                        None => {
                            return Ok((src_len + look_ahead, Status::NeedsMoreInput));
                        }
                        Some(probe) => {
                            if check_end_mark_now && probe != Probe::Match {
                                return Err(Error::corrupted(
                                    "expected end marker at output limit",
                                ));
                            }
                        }
                    }
                }
                let temp = self.temp_buf;
                let processed = self.decode_real2(dic, dic_limit, &temp[..rem], 0)?;
                look_ahead -= rem - processed;
                src_len += look_ahead;
                self.temp_buf_size = 0;
            }
        }

        if self.code == 0 {
            Ok((src_len, Status::FinishedWithMark))
        } else {
            Err(Error::corrupted("range coder not drained at end marker"))
        }
    }

    /// Flush a pending repeat run left over from a previous limit hit.
    fn write_rem(&mut self, dic: &mut DictView<'_>, limit: usize) {
        if self.remain_len == 0 || self.remain_len >= MATCH_SPEC_LEN_START {
            return;
        }
        let mut len = self.remain_len;
        let rep0 = self.reps[0] as usize;
        if limit - dic.pos < len {
            len = limit - dic.pos;
        }
        if self.check_dic_size == 0
            && (self.props.dic_size - self.processed_pos) as usize <= len
        {
            self.check_dic_size = self.props.dic_size;
        }
        self.processed_pos = self.processed_pos.wrapping_add(len as u32);
        self.remain_len -= len;
        let mut pos = dic.pos;
        for _ in 0..len {
            let back = dic.back_index(pos, rep0);
            dic.mem[pos] = dic.mem[back];
            pos += 1;
        }
        dic.pos = pos;
    }

    /// Outer decode loop: clamps the limit while the dictionary has not yet
    /// filled once, re-enters the inner loop, and flushes pending runs.
    fn decode_real2(
        &mut self,
        dic: &mut DictView<'_>,
        limit: usize,
        src: &[u8],
        buf_limit: usize,
    ) -> Result<usize> {
        let mut total = 0usize;
        loop {
            let mut limit2 = limit;
            if self.check_dic_size == 0 {
                let rem = (self.props.dic_size - self.processed_pos) as usize;
                if limit - dic.pos > rem {
                    limit2 = dic.pos + rem;
                }
            }
            total += self.decode_real(dic, limit2, &src[total..], buf_limit.saturating_sub(total))?;
            if self.processed_pos >= self.props.dic_size {
                self.check_dic_size = self.props.dic_size;
            }
            self.write_rem(dic, limit);
            if !(dic.pos < limit && total < buf_limit && self.remain_len < MATCH_SPEC_LEN_START) {
                break;
            }
        }
        if self.remain_len > MATCH_SPEC_LEN_START {
            self.remain_len = MATCH_SPEC_LEN_START;
        }
        Ok(total)
    }

    /// The per-symbol inner loop. Always decodes at least one symbol; keeps
    /// going while output room remains and the read cursor is below
    /// `buf_limit` (reads may run up to [`REQUIRED_INPUT_MAX`] bytes past it
    /// mid-symbol, which the caller guarantees is in bounds).
    fn decode_real(
        &mut self,
        dic: &mut DictView<'_>,
        limit: usize,
        src: &[u8],
        buf_limit: usize,
    ) -> Result<usize> {
        let pb_mask = (1u32 << self.props.pb) - 1;
        let lp_mask = (1u32 << self.props.lp) - 1;
        let lc = self.props.lc;

        let mut state = self.state;
        let mut rep0 = self.reps[0];
        let mut rep1 = self.reps[1];
        let mut rep2 = self.reps[2];
        let mut rep3 = self.reps[3];
        let mut processed = self.processed_pos;
        let check = self.check_dic_size;
        let mut len = 0usize;

        let size = dic.size();
        let mut dic_pos = dic.pos;

        let probs = self.probs.as_mut_slice();
        let mut rc = RangeDecoder {
            range: self.range,
            code: self.code,
            buf: src,
            pos: 0,
        };

        loop {
            let pos_state = (processed & pb_mask) as usize;

            if rc.decode_bit(&mut probs[IS_MATCH + (state << NUM_POS_BITS_MAX) + pos_state]) == 0 {
                // Literal.
                let lit_base = if check != 0 || processed != 0 {
                    let prev = u32::from(dic.mem[dic.back_index(dic_pos, 1)]);
                    LITERAL
                        + LIT_SIZE
                            * ((((processed & lp_mask) << lc) + (prev >> (8 - lc))) as usize)
                } else {
                    LITERAL
                };
                let mut symbol = 1usize;
                if state < NUM_LIT_STATES {
                    state -= if state < 4 { state } else { 3 };
                    while symbol < 0x100 {
                        symbol = (symbol << 1) | rc.decode_bit(&mut probs[lit_base + symbol]) as usize;
                    }
                } else {
                    // Matched literal: fold the byte at rep0 into the context
                    // and drop it once the decoded bits diverge.
                    let back = dic.back_index(dic_pos, rep0 as usize);
                    let mut match_byte = u32::from(dic.mem[back]);
                    let mut offs: u32 = 0x100;
                    state -= if state < 10 { 3 } else { 6 };
                    while symbol < 0x100 {
                        match_byte <<= 1;
                        let bit_mask = match_byte & offs;
                        let b = rc
                            .decode_bit(&mut probs[lit_base + (offs + bit_mask) as usize + symbol]);
                        symbol = (symbol << 1) | b as usize;
                        if b == 0 {
                            offs &= !bit_mask;
                        } else {
                            offs &= bit_mask;
                        }
                    }
                }
                dic.mem[dic_pos] = symbol as u8;
                dic_pos += 1;
                processed = processed.wrapping_add(1);
            } else {
                let len_base;
                let mut short_rep = false;
                if rc.decode_bit(&mut probs[IS_REP + state]) == 0 {
                    // Simple match; the distance decode below keys on the
                    // shifted state.
                    state += NUM_STATES;
                    len_base = LEN_CODER;
                } else {
                    if check == 0 && processed == 0 {
                        return Err(Error::corrupted("repeat match at stream start"));
                    }
                    if rc.decode_bit(&mut probs[IS_REP_G0 + state]) == 0 {
                        if rc.decode_bit(
                            &mut probs[IS_REP0_LONG + (state << NUM_POS_BITS_MAX) + pos_state],
                        ) == 0
                        {
                            // Single-byte repeat of rep0.
                            let back = dic.back_index(dic_pos, rep0 as usize);
                            dic.mem[dic_pos] = dic.mem[back];
                            dic_pos += 1;
                            processed = processed.wrapping_add(1);
                            state = if state < NUM_LIT_STATES { 9 } else { 11 };
                            short_rep = true;
                        }
                    } else {
                        let distance;
                        if rc.decode_bit(&mut probs[IS_REP_G1 + state]) == 0 {
                            distance = rep1;
                        } else {
                            if rc.decode_bit(&mut probs[IS_REP_G2 + state]) == 0 {
                                distance = rep2;
                            } else {
                                distance = rep3;
                                rep3 = rep2;
                            }
                            rep2 = rep1;
                        }
                        rep1 = rep0;
                        rep0 = distance;
                    }
                    if !short_rep {
                        state = if state < NUM_LIT_STATES { 8 } else { 11 };
                    }
                    len_base = REP_LEN_CODER;
                }

                if !short_rep {
                    // Length.
                    if rc.decode_bit(&mut probs[len_base + LEN_CHOICE]) == 0 {
                        let base = len_base + LEN_LOW + (pos_state << LEN_NUM_LOW_BITS);
                        len = rc.tree_decode(&mut probs[base..], LEN_NUM_LOW_BITS);
                    } else if rc.decode_bit(&mut probs[len_base + LEN_CHOICE2]) == 0 {
                        let base = len_base + LEN_MID + (pos_state << LEN_NUM_MID_BITS);
                        len = LEN_NUM_LOW_SYMBOLS + rc.tree_decode(&mut probs[base..], LEN_NUM_MID_BITS);
                    } else {
                        let base = len_base + LEN_HIGH;
                        len = LEN_NUM_LOW_SYMBOLS
                            + LEN_NUM_MID_SYMBOLS
                            + rc.tree_decode(&mut probs[base..], LEN_NUM_HIGH_BITS);
                    }

                    if state >= NUM_STATES {
                        // Distance for a simple match.
                        let lts = if len < NUM_LEN_TO_POS_STATES {
                            len
                        } else {
                            NUM_LEN_TO_POS_STATES - 1
                        };
                        let slot = rc.tree_decode(
                            &mut probs[POS_SLOT + (lts << NUM_POS_SLOT_BITS)..],
                            NUM_POS_SLOT_BITS,
                        );
                        let mut distance;
                        if slot < START_POS_MODEL_INDEX {
                            distance = slot as u32;
                        } else {
                            let num_direct = (slot >> 1) as u32 - 1;
                            distance = 2 | (slot as u32 & 1);
                            if slot < END_POS_MODEL_INDEX {
                                distance <<= num_direct;
                                let base = SPEC_POS + distance as usize - slot - 1;
                                distance |= rc.reverse_tree_decode(&mut probs[base..], num_direct);
                            } else {
                                for _ in 0..num_direct - NUM_ALIGN_BITS {
                                    distance = (distance << 1) | rc.decode_direct_bit();
                                }
                                distance <<= NUM_ALIGN_BITS;
                                distance |=
                                    rc.reverse_tree_decode(&mut probs[ALIGN..], NUM_ALIGN_BITS);
                                if distance == u32::MAX {
                                    // End-of-stream marker.
                                    len += MATCH_SPEC_LEN_START;
                                    state -= NUM_STATES;
                                    break;
                                }
                            }
                        }
                        rep3 = rep2;
                        rep2 = rep1;
                        rep1 = rep0;
                        rep0 = distance + 1;
                        if check == 0 {
                            if distance >= processed {
                                return Err(Error::corrupted("distance past start of stream"));
                            }
                        } else if distance >= check {
                            return Err(Error::corrupted("distance exceeds dictionary size"));
                        }
                        state = if state < NUM_STATES + NUM_LIT_STATES {
                            NUM_LIT_STATES
                        } else {
                            NUM_LIT_STATES + 3
                        };
                    }

                    len += MATCH_MIN_LEN;
                    if limit == dic_pos {
                        return Err(Error::corrupted("match decoded with no output room"));
                    }

                    let rem = limit - dic_pos;
                    let mut cur_len = if rem < len { rem } else { len };
                    let mut back = dic.back_index(dic_pos, rep0 as usize);
                    processed = processed.wrapping_add(cur_len as u32);
                    len -= cur_len;
                    // Byte-at-a-time on purpose: a distance smaller than the
                    // length re-reads bytes this same match just produced.
                    if back + cur_len <= size {
                        for _ in 0..cur_len {
                            dic.mem[dic_pos] = dic.mem[back];
                            dic_pos += 1;
                            back += 1;
                        }
                    } else {
                        while cur_len > 0 {
                            dic.mem[dic_pos] = dic.mem[back];
                            dic_pos += 1;
                            back += 1;
                            if back == size {
                                back = 0;
                            }
                            cur_len -= 1;
                        }
                    }
                }
            }

            if !(dic_pos < limit && rc.pos < buf_limit) {
                break;
            }
        }

        rc.normalize();
        let consumed = rc.pos;
        self.range = rc.range;
        self.code = rc.code;
        self.remain_len = len;
        self.processed_pos = processed;
        self.reps = [rep0, rep1, rep2, rep3];
        self.state = state;
        dic.pos = dic_pos;
        Ok(consumed)
    }

    /// Re-run one symbol decode against a snapshot of the range-coder state
    /// without mutating anything. `None` means the input is truncated
    /// mid-symbol.
    fn try_dummy(&self, dic: &DictView<'_>, src: &[u8]) -> Option<Probe> {
        let probs = self.probs.as_slice();
        let state = self.state;
        let pos_state = (self.processed_pos & ((1 << self.props.pb) - 1)) as usize;
        let mut rc = ProbeDecoder {
            range: self.range,
            code: self.code,
            buf: src,
            pos: 0,
        };

        let res;
        if rc.decode_bit(probs[IS_MATCH + (state << NUM_POS_BITS_MAX) + pos_state])? == 0 {
            let lit_base = if self.check_dic_size != 0 || self.processed_pos != 0 {
                let prev = u32::from(dic.back_byte(1));
                LITERAL
                    + LIT_SIZE
                        * ((((self.processed_pos & ((1 << self.props.lp) - 1)) << self.props.lc)
                            + (prev >> (8 - self.props.lc))) as usize)
            } else {
                LITERAL
            };
            let mut symbol = 1usize;
            if state < NUM_LIT_STATES {
                while symbol < 0x100 {
                    symbol = (symbol << 1) | rc.decode_bit(probs[lit_base + symbol])? as usize;
                }
            } else {
                let mut match_byte = u32::from(dic.back_byte(self.reps[0] as usize));
                let mut offs: u32 = 0x100;
                while symbol < 0x100 {
                    match_byte <<= 1;
                    let bit_mask = match_byte & offs;
                    let b = rc.decode_bit(probs[lit_base + (offs + bit_mask) as usize + symbol])?;
                    symbol = (symbol << 1) | b as usize;
                    if b == 0 {
                        offs &= !bit_mask;
                    } else {
                        offs &= bit_mask;
                    }
                }
            }
            res = Probe::Lit;
        } else {
            let len_base;
            let is_simple;
            if rc.decode_bit(probs[IS_REP + state])? == 0 {
                is_simple = true;
                len_base = LEN_CODER;
            } else {
                is_simple = false;
                if rc.decode_bit(probs[IS_REP_G0 + state])? == 0 {
                    if rc
                        .decode_bit(probs[IS_REP0_LONG + (state << NUM_POS_BITS_MAX) + pos_state])?
                        == 0
                    {
                        rc.normalize()?;
                        return Some(Probe::Rep);
                    }
                } else if rc.decode_bit(probs[IS_REP_G1 + state])? == 1 {
                    rc.decode_bit(probs[IS_REP_G2 + state])?;
                }
                len_base = REP_LEN_CODER;
            }

            let len;
            if rc.decode_bit(probs[len_base + LEN_CHOICE])? == 0 {
                let base = len_base + LEN_LOW + (pos_state << LEN_NUM_LOW_BITS);
                let mut m = 1usize;
                while m < LEN_NUM_LOW_SYMBOLS {
                    m = (m << 1) | rc.decode_bit(probs[base + m])? as usize;
                }
                len = m - LEN_NUM_LOW_SYMBOLS;
            } else if rc.decode_bit(probs[len_base + LEN_CHOICE2])? == 0 {
                let base = len_base + LEN_MID + (pos_state << LEN_NUM_MID_BITS);
                let mut m = 1usize;
                while m < LEN_NUM_MID_SYMBOLS {
                    m = (m << 1) | rc.decode_bit(probs[base + m])? as usize;
                }
                len = LEN_NUM_LOW_SYMBOLS + (m - LEN_NUM_MID_SYMBOLS);
            } else {
                let base = len_base + LEN_HIGH;
                let mut m = 1usize;
                while m < LEN_NUM_HIGH_SYMBOLS {
                    m = (m << 1) | rc.decode_bit(probs[base + m])? as usize;
                }
                len = LEN_NUM_LOW_SYMBOLS + LEN_NUM_MID_SYMBOLS + (m - LEN_NUM_HIGH_SYMBOLS);
            }

            if is_simple {
                let lts = if len < NUM_LEN_TO_POS_STATES {
                    len
                } else {
                    NUM_LEN_TO_POS_STATES - 1
                };
                let base = POS_SLOT + (lts << NUM_POS_SLOT_BITS);
                let mut m = 1usize;
                while m < 1 << NUM_POS_SLOT_BITS {
                    m = (m << 1) | rc.decode_bit(probs[base + m])? as usize;
                }
                let slot = m - (1 << NUM_POS_SLOT_BITS);
                if slot >= START_POS_MODEL_INDEX {
                    let mut num_direct = (slot >> 1) as u32 - 1;
                    let base;
                    if slot < END_POS_MODEL_INDEX {
                        base = SPEC_POS + (((2 | (slot & 1)) << num_direct) - slot - 1);
                    } else {
                        num_direct -= NUM_ALIGN_BITS;
                        while num_direct > 0 {
                            rc.decode_direct_bit()?;
                            num_direct -= 1;
                        }
                        base = ALIGN;
                        num_direct = NUM_ALIGN_BITS;
                    }
                    let mut m = 1usize;
                    while num_direct > 0 {
                        m = (m << 1) | rc.decode_bit(probs[base + m])? as usize;
                        num_direct -= 1;
                    }
                }
            }
            res = if is_simple { Probe::Match } else { Probe::Rep };
        }

        rc.normalize()?;
        Some(res)
    }

    #[cfg(test)]
    fn test_instance(dic_size: u32) -> Self {
        Self::new(Properties {
            lc: 3,
            lp: 0,
            pb: 2,
            dic_size,
        })
    }
}
