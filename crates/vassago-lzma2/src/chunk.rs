//! LZMA2 chunk framing: control bytes and header states.
//!
//! Every chunk opens with a control byte:
//!
//! ```text
//! 00000000           end of stream
//! 00000001 U U       uncompressed chunk, reset dictionary
//! 00000010 U U       uncompressed chunk, no reset
//! 100uuuuu U U P P   LZMA, no reset
//! 101uuuuu U U P P   LZMA, reset state
//! 110uuuuu U U P P S LZMA, reset state, new properties
//! 111uuuuu U U P P S LZMA, reset state, new properties, reset dictionary
//! ```
//!
//! `u`/`U` carry the unpack size minus one (big-endian, the control byte
//! holding the top five bits), `P P` the pack size minus one, `S` the LZMA
//! properties byte. Control bytes `0x03..=0x7F` are invalid.

/// End-of-stream control byte.
pub(crate) const CONTROL_EOS: u8 = 0x00;
/// Uncompressed chunk that resets the dictionary first.
pub(crate) const CONTROL_COPY_RESET_DIC: u8 = 0x01;
/// Uncompressed chunk appended to the current dictionary.
pub(crate) const CONTROL_COPY_NO_RESET: u8 = 0x02;
/// High bit marking an LZMA chunk.
pub(crate) const CONTROL_LZMA: u8 = 0x80;

/// Header-parsing states of the framing machine.
///
/// `Data` means "first payload byte of the current chunk is next";
/// `DataCont` resumes a partially decoded chunk. There is no error state:
/// every violation raises [`vassago_core::Error::Corrupted`] at detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChunkState {
    Control,
    Unpack0,
    Unpack1,
    Pack0,
    Pack1,
    Prop,
    Data,
    DataCont,
    Finished,
}

/// Whether a control byte denotes an uncompressed (copy) chunk.
#[inline]
pub(crate) fn is_uncompressed(control: u8) -> bool {
    control & CONTROL_LZMA == 0
}

/// The two-bit reset mode of an LZMA control byte:
/// 0 = none, 1 = state, 2 = state + properties, 3 = state + properties + dictionary.
#[inline]
pub(crate) fn lzma_mode(control: u8) -> u8 {
    (control >> 5) & 0x03
}

/// Modes 2 and 3 carry a properties byte after the sizes.
#[inline]
pub(crate) fn has_new_props(mode: u8) -> bool {
    mode >= 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_classification() {
        assert!(is_uncompressed(CONTROL_EOS));
        assert!(is_uncompressed(CONTROL_COPY_RESET_DIC));
        assert!(is_uncompressed(CONTROL_COPY_NO_RESET));
        assert!(is_uncompressed(0x7F));
        assert!(!is_uncompressed(0x80));
        assert!(!is_uncompressed(0xFF));
    }

    #[test]
    fn test_lzma_mode_bands() {
        assert_eq!(lzma_mode(0x80), 0);
        assert_eq!(lzma_mode(0x9F), 0);
        assert_eq!(lzma_mode(0xA0), 1);
        assert_eq!(lzma_mode(0xBF), 1);
        assert_eq!(lzma_mode(0xC0), 2);
        assert_eq!(lzma_mode(0xDF), 2);
        assert_eq!(lzma_mode(0xE0), 3);
        assert_eq!(lzma_mode(0xFF), 3);
    }

    #[test]
    fn test_props_carried_by_modes_two_and_three() {
        assert!(!has_new_props(0));
        assert!(!has_new_props(1));
        assert!(has_new_props(2));
        assert!(has_new_props(3));
    }
}
