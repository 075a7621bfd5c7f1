//! Core traits for decompression.
//!
//! ## Trait Hierarchy
//!
//! ```text
//! Decompressor             (one-shot operations)
//! StreamingDecompressor    (incremental, resumable)
//! ```

use crate::error::Result;

/// One-shot decompression operations.
pub trait Decompressor {
    /// Decompress data in one shot.
    ///
    /// # Arguments
    /// * `input` - Complete compressed stream
    ///
    /// # Returns
    /// Decompressed data as a vector.
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress data into an existing buffer.
    ///
    /// # Arguments
    /// * `input` - Complete compressed stream
    /// * `output` - Buffer to write decompressed data
    ///
    /// # Returns
    /// Number of bytes written to output.
    fn decompress_to(&self, input: &[u8], output: &mut [u8]) -> Result<usize>;

    /// Decompress with known output size (more efficient).
    fn decompress_with_size(&self, input: &[u8], output_size: usize) -> Result<Vec<u8>> {
        let mut output = vec![0u8; output_size];
        let written = self.decompress_to(input, &mut output)?;
        output.truncate(written);
        Ok(output)
    }
}

/// Streaming decompression for incremental processing.
///
/// The caller pumps compressed bytes in and reads decompressed bytes out;
/// the decompressor never performs I/O itself. Implementations are fully
/// resumable: a chunk call that makes no progress only means more input or
/// more output room is needed.
pub trait StreamingDecompressor {
    /// Begin a new decompression stream, discarding any previous state.
    fn begin(&mut self) -> Result<()>;

    /// Decompress a chunk of data.
    ///
    /// # Arguments
    /// * `input` - Compressed data chunk
    /// * `output` - Buffer for decompressed output
    ///
    /// # Returns
    /// Tuple of (bytes_read, bytes_written, is_finished).
    fn decompress_chunk(&mut self, input: &[u8], output: &mut [u8]) -> Result<(usize, usize, bool)>;

    /// Check if decompression is complete.
    fn is_finished(&self) -> bool;

    /// Reset decompressor state for reuse.
    fn reset(&mut self);
}
