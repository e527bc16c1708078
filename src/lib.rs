//! Lossless predictive compression for LiDAR point records.
//!
//! Records are compressed field by field: each field codec predicts the
//! next value from previous points and entropy codes the correction with
//! an adaptive range coder. [`Compressor`] and [`Decompressor`] are the
//! entry points, they cut the stream into fixed point-count chunks with
//! a full codec reset at each boundary.
//!
//! # Examples
//!
//! ```
//! use pointzip::{Compressor, Decompressor, Error, RecordLayout};
//!
//! # fn main() -> Result<(), Error> {
//! let layout = RecordLayout::for_point_format(1, 0)?;
//!
//! let mut compressor = Compressor::new(std::io::Cursor::new(Vec::new()), layout.clone())?;
//! let record = vec![0u8; layout.record_size()];
//! compressor.compress_one(&record)?;
//! compressor.done()?;
//!
//! let mut stream = compressor.into_stream();
//! stream.set_position(0);
//!
//! let mut decompressor = Decompressor::new(stream, layout)?;
//! let mut out = vec![0u8; record.len()];
//! decompressor.decompress_one(&mut out)?;
//! assert_eq!(out, record);
//! # Ok(())
//! # }
//! ```
//!
//! Layered point formats (6 and above) additionally support selective
//! decompression: build the [`Decompressor`] with a
//! [`DecompressionSelector`] and the skipped fields keep the value of
//! the first point of each chunk while their layer bytes are skipped
//! over without being decoded.

pub(crate) mod entropy;
pub(crate) mod layers;
pub(crate) mod packing;
pub(crate) mod predictor;
pub(crate) mod utils;

pub mod chunked;
pub mod errors;
pub mod fields;
pub mod layout;
pub mod record;

pub use chunked::{Compressor, Decompressor, DEFAULT_CHUNK_SIZE};
pub use errors::Error;
pub use layout::{DecompressionSelector, FieldDescriptor, FieldKind, RecordLayout};
pub use record::{record_compressor_from_layout, record_decompressor_from_layout};

pub type Result<T> = std::result::Result<T, Error>;
