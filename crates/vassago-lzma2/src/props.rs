//! LZMA properties and their encoded forms.
//!
//! Two property encodings appear in an LZMA2 stream:
//!
//! - the single stream-level property byte `p <= 40`, which fixes the
//!   dictionary size for the whole stream;
//! - the per-chunk LZMA properties byte `q < 225`, carried by chunks that
//!   reload properties, packing `lc`, `lp` and `pb` as `(pb * 5 + lp) * 9 + lc`.

use vassago_core::{Error, Result};

/// Maximum value of the stream-level property byte.
pub const MAX_PROP_BYTE: u8 = 40;

/// LZMA2 restricts the literal context to `lc + lp <= 4`.
pub(crate) const LC_PLUS_LP_MAX: u32 = 4;

/// Decoded LZMA properties.
///
/// `lc` is the number of literal context bits (0..8), `lp` the number of
/// literal position bits (0..4), `pb` the number of position bits (0..4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    pub lc: u32,
    pub lp: u32,
    pub pb: u32,
    /// Dictionary size in bytes, derived from the stream property byte.
    pub dic_size: u32,
}

/// Derive the dictionary size from the stream-level property byte.
///
/// `p == 40` selects the maximum (`u32::MAX`); otherwise the size is
/// `(2 | (p & 1)) << (p / 2 + 11)`, i.e. 4 KiB, 6 KiB, 8 KiB, 12 KiB, ...
pub fn dic_size_from_prop(prop: u8) -> Result<u32> {
    if prop > MAX_PROP_BYTE {
        return Err(Error::invalid_properties(format!(
            "stream property byte {prop} out of range 0..=40"
        )));
    }
    if prop == MAX_PROP_BYTE {
        return Ok(u32::MAX);
    }
    Ok((2 | u32::from(prop & 1)) << (prop / 2 + 11))
}

/// Decode a per-chunk LZMA properties byte into `(lc, lp, pb)`.
///
/// Rejects bytes >= 225 and combinations with `lc + lp > 4` (the LZMA2
/// restriction that bounds the probability table).
pub(crate) fn parse_lzma_props(b: u8) -> Result<(u32, u32, u32)> {
    if b >= 9 * 5 * 5 {
        return Err(Error::corrupted(format!("invalid LZMA properties byte {b}")));
    }
    let lc = u32::from(b % 9);
    let rest = u32::from(b / 9);
    let pb = rest / 5;
    let lp = rest % 5;
    if lc + lp > LC_PLUS_LP_MAX {
        return Err(Error::corrupted(format!(
            "lc {lc} + lp {lp} exceeds the LZMA2 limit of {LC_PLUS_LP_MAX}"
        )));
    }
    Ok((lc, lp, pb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dic_size_table() {
        assert_eq!(dic_size_from_prop(0).unwrap(), 4096);
        assert_eq!(dic_size_from_prop(1).unwrap(), 6144);
        assert_eq!(dic_size_from_prop(2).unwrap(), 8192);
        assert_eq!(dic_size_from_prop(3).unwrap(), 12288);
        assert_eq!(dic_size_from_prop(24).unwrap(), 16 << 20);
        assert_eq!(dic_size_from_prop(25).unwrap(), 24 << 20);
        assert_eq!(dic_size_from_prop(39).unwrap(), 0xC000_0000);
        assert_eq!(dic_size_from_prop(40).unwrap(), u32::MAX);
    }

    #[test]
    fn test_prop_byte_out_of_range() {
        assert!(dic_size_from_prop(41).is_err());
        assert!(dic_size_from_prop(255).is_err());
    }

    #[test]
    fn test_lzma_props_decomposition() {
        // classic defaults: lc=3, lp=0, pb=2 -> (2*5 + 0)*9 + 3 = 93
        assert_eq!(parse_lzma_props(93).unwrap(), (3, 0, 2));
        assert_eq!(parse_lzma_props(0).unwrap(), (0, 0, 0));
        // lc=0, lp=2, pb=1 -> (1*5 + 2)*9 = 63
        assert_eq!(parse_lzma_props(63).unwrap(), (0, 2, 1));
        // lc=4, lp=0, pb=0 -> 4
        assert_eq!(parse_lzma_props(4).unwrap(), (4, 0, 0));
    }

    #[test]
    fn test_lzma_props_rejects_overflow_byte() {
        assert!(parse_lzma_props(225).is_err());
        assert!(parse_lzma_props(255).is_err());
    }

    #[test]
    fn test_lzma_props_rejects_wide_literal_context() {
        // lc=4, lp=1 -> (0*5 + 1)*9 + 4 = 13; lc + lp = 5
        assert!(parse_lzma_props(13).is_err());
        // lc=8, lp=0, pb=0 -> 8; lc alone exceeds the limit
        assert!(parse_lzma_props(8).is_err());
    }
}
