//! End-to-end decodes of pre-generated fixture streams.

mod common;

use common::*;
use vassago_lzma2::{
    lzma2_decode, Decompressor, FinishMode, Lzma2BufDecoder, Lzma2Decompressor, Status,
};

#[test]
fn literal_only_chunk_roundtrip() {
    let (out, status) = decode_buffered(LCG_LITERALS, 400);
    assert_eq!(out, lcg_bytes(300));
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn match_classes_across_two_chunks() {
    let (out, status) = decode_buffered(MIXED_OPS, MIXED_OPS_PLAIN.len() + 64);
    assert_eq!(out, MIXED_OPS_PLAIN);
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn mixed_ops_one_shot_with_finish_end() {
    let (prop, body) = split_stream(MIXED_OPS);
    let mut out = vec![0u8; MIXED_OPS_PLAIN.len()];
    let (written, consumed, status) =
        lzma2_decode(&mut out, body, prop, FinishMode::End).unwrap();
    assert_eq!(&out[..written], MIXED_OPS_PLAIN);
    assert_eq!(consumed, body.len());
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn property_reload_between_chunks() {
    let (out, status) = decode_buffered(PROPS_SWITCH, PROPS_SWITCH_PLAIN.len() + 64);
    assert_eq!(out, PROPS_SWITCH_PLAIN);
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn lzma_chunk_references_uncompressed_history() {
    let (out, status) = decode_buffered(COPY_THEN_LZMA, COPY_THEN_LZMA_PLAIN.len() + 64);
    assert_eq!(out, COPY_THEN_LZMA_PLAIN);
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn embedded_end_marker_is_rejected() {
    let (prop, body) = split_stream(EMBEDDED_END_MARKER);
    let mut out = vec![0u8; 256];
    let err = lzma2_decode(&mut out, body, prop, FinishMode::End).unwrap_err();
    assert!(err.to_string().contains("corrupted"));
}

#[test]
fn output_larger_than_dictionary_wraps_the_window() {
    // property byte 0 gives a 4 KiB dictionary; the stream decodes to ~10 KiB
    let (prop, _) = split_stream(WRAP);
    assert_eq!(prop, 0);
    assert!(WRAP_PLAIN.len() > 2 * 4096);
    let (out, status) = decode_buffered(WRAP, WRAP_PLAIN.len() + 64);
    assert_eq!(out.len(), WRAP_PLAIN.len());
    assert_eq!(out, WRAP_PLAIN);
    assert_eq!(status, Status::FinishedWithMark);
}

#[test]
fn wrap_stream_survives_small_copy_out_buffers() {
    // drain through a destination far smaller than the dictionary, so the
    // copy-out / wrap ordering gets exercised at every window edge
    let (prop, body) = split_stream(WRAP);
    let mut decoder = Lzma2BufDecoder::new(prop).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 333];
    let mut fed = 0usize;
    loop {
        let (written, read, status) = decoder
            .decode_to_buf(&mut buf, &body[fed..], FinishMode::Any)
            .unwrap();
        fed += read;
        out.extend_from_slice(&buf[..written]);
        if status == Status::FinishedWithMark {
            break;
        }
        assert!(written > 0 || read > 0, "stalled");
    }
    assert_eq!(out, WRAP_PLAIN);
}

#[test]
fn decompressor_trait_decodes_full_streams() {
    let codec = Lzma2Decompressor::new();
    assert_eq!(codec.decompress(MIXED_OPS).unwrap(), MIXED_OPS_PLAIN);
    assert_eq!(codec.decompress(PROPS_SWITCH).unwrap(), PROPS_SWITCH_PLAIN);
    assert_eq!(
        codec
            .decompress_with_size(COPY_THEN_LZMA, COPY_THEN_LZMA_PLAIN.len())
            .unwrap(),
        COPY_THEN_LZMA_PLAIN
    );
}

#[test]
fn large_lcg_stream_through_uncompressed_chunks() {
    // spec-style bulk roundtrip without an encoder: the payload rides in
    // uncompressed chunks, decoded through a 4 KiB dictionary
    let data = lcg_bytes(256 * 1024);
    let body = build_copy_stream(&data, 4000);
    let mut with_prop = vec![0u8];
    with_prop.extend_from_slice(&body);

    let (out, status) = decode_buffered(&with_prop, data.len() + 64);
    assert_eq!(out, data);
    assert_eq!(status, Status::FinishedWithMark);

    // and the same stream fed in uneven pieces
    let (out, status) = decode_in_pieces(&with_prop, 777, 8192);
    assert_eq!(out, data);
    assert_eq!(status, Status::FinishedWithMark);
}
