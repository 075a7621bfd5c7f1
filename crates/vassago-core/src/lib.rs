//! # Vassago Core
//!
//! Core error type and decode traits for the Vassago decompression library.
//!
//! Vassago is named after the third demon of the Ars Goetia, who discovers
//! all things hidden and lost - fitting work for a decoder that recovers
//! original bytes from their compressed form.
//!
//! ## Design Philosophy
//!
//! - **No I/O**: decoders consume caller-supplied byte slices and write to
//!   caller-visible buffers; files and sockets stay outside
//! - **Streaming-first**: every codec supports incremental, resumable decode
//! - **Fail loudly**: corruption is a hard error, never a best-effort output
//!
//! ## Core Traits
//!
//! - [`Decompressor`] - One-shot decompression operations
//! - [`StreamingDecompressor`] - Incremental decompression

pub mod error;
pub mod traits;

pub use error::{Error, Result};
pub use traits::{Decompressor, StreamingDecompressor};
