//! Chunked streaming compression.
//!
//! Both halves cut the record stream into fixed point-count chunks and
//! fully reset the codec state at every boundary, so a decoder can pick
//! up any chunk knowing nothing but the layout and the chunk size.

use std::io::{Read, Seek, Write};

use crate::layout::{DecompressionSelector, RecordLayout};
use crate::record::{
    record_compressor_from_layout, record_decompressor_from_layout, RecordCompressor,
    RecordDecompressor,
};
use crate::Error;

pub const DEFAULT_CHUNK_SIZE: u32 = 50_000;

fn check_buffer_len(buffer_len: usize, record_size: usize) -> crate::Result<()> {
    if buffer_len % record_size != 0 {
        Err(Error::BufferLenNotMultipleOfRecordSize {
            buffer_len,
            record_size,
        })
    } else {
        Ok(())
    }
}

/// Compresses records into fixed size chunks.
pub struct Compressor<'a, W: Write + 'a> {
    record_compressor: Box<dyn RecordCompressor<W> + 'a>,
    layout: RecordLayout,
    chunk_size: u32,
    chunk_point_written: u32,
}

impl<'a, W: Write + 'a> Compressor<'a, W> {
    pub fn new(dst: W, layout: RecordLayout) -> crate::Result<Self> {
        Self::with_chunk_size(dst, layout, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(dst: W, layout: RecordLayout, chunk_size: u32) -> crate::Result<Self> {
        let record_compressor = record_compressor_from_layout(dst, &layout)?;
        Ok(Self {
            record_compressor,
            layout,
            chunk_size,
            chunk_point_written: 0,
        })
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn record_size(&self) -> usize {
        self.record_compressor.record_size()
    }

    /// Compresses one record, `input` holds its raw bytes.
    pub fn compress_one(&mut self, input: &[u8]) -> crate::Result<()> {
        if self.chunk_point_written == self.chunk_size {
            self.record_compressor.done()?;
            self.record_compressor.reset();
            self.record_compressor.set_fields_from(self.layout.fields())?;
            self.chunk_point_written = 0;
        }
        self.record_compressor.compress_next(input)?;
        self.chunk_point_written += 1;
        Ok(())
    }

    /// Compresses the records packed back to back in `input`.
    pub fn compress_many(&mut self, input: &[u8]) -> crate::Result<()> {
        check_buffer_len(input.len(), self.record_size())?;
        for record in input.chunks_exact(self.record_size()) {
            self.compress_one(record)?;
        }
        Ok(())
    }

    /// Flushes the current chunk. Must be called once after the last
    /// record, before the stream is used.
    pub fn done(&mut self) -> crate::Result<()> {
        self.record_compressor.done()?;
        Ok(())
    }

    pub fn borrow_stream_mut(&mut self) -> &mut W {
        self.record_compressor.borrow_stream_mut()
    }

    pub fn into_stream(self) -> W {
        self.record_compressor.box_into_stream()
    }
}

/// Decompresses records written by [Compressor].
///
/// The chunk size is not part of the stream, the caller must hand over
/// the one used at compression time.
pub struct Decompressor<'a, R: Read + Seek + 'a> {
    record_decompressor: Box<dyn RecordDecompressor<R> + 'a>,
    layout: RecordLayout,
    selector: DecompressionSelector,
    chunk_size: u32,
    chunk_points_read: u32,
}

impl<'a, R: Read + Seek + 'a> Decompressor<'a, R> {
    pub fn new(src: R, layout: RecordLayout) -> crate::Result<Self> {
        Self::selective(src, layout, DecompressionSelector::all())
    }

    pub fn selective(
        src: R,
        layout: RecordLayout,
        selector: DecompressionSelector,
    ) -> crate::Result<Self> {
        Self::with_chunk_size(src, layout, selector, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(
        src: R,
        layout: RecordLayout,
        selector: DecompressionSelector,
        chunk_size: u32,
    ) -> crate::Result<Self> {
        let record_decompressor = record_decompressor_from_layout(src, &layout, selector)?;
        Ok(Self {
            record_decompressor,
            layout,
            selector,
            chunk_size,
            chunk_points_read: 0,
        })
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn record_size(&self) -> usize {
        self.record_decompressor.record_size()
    }

    /// Decompresses one record into `out`.
    pub fn decompress_one(&mut self, out: &mut [u8]) -> crate::Result<()> {
        if self.chunk_points_read == self.chunk_size {
            self.record_decompressor.reset();
            self.record_decompressor
                .set_fields_from(self.layout.fields(), self.selector)?;
            self.chunk_points_read = 0;
        }
        self.record_decompressor.decompress_next(out)?;
        self.chunk_points_read += 1;
        Ok(())
    }

    /// Decompresses as many records as fit in `out`, back to back.
    pub fn decompress_many(&mut self, out: &mut [u8]) -> crate::Result<()> {
        check_buffer_len(out.len(), self.record_size())?;
        for record in out.chunks_exact_mut(self.record_size()) {
            self.decompress_one(record)?;
        }
        Ok(())
    }

    pub fn borrow_stream_mut(&mut self) -> &mut R {
        self.record_decompressor.borrow_stream_mut()
    }

    pub fn into_stream(self) -> R {
        self.record_decompressor.box_into_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn buffer_len_must_be_a_multiple_of_the_record_size() {
        let layout = RecordLayout::for_point_format(0, 0).unwrap();
        let mut compressor = Compressor::new(Cursor::new(Vec::new()), layout).unwrap();
        assert_eq!(compressor.record_size(), 20);

        let result = compressor.compress_many(&[0u8; 30]);
        assert!(matches!(
            result,
            Err(Error::BufferLenNotMultipleOfRecordSize {
                buffer_len: 30,
                record_size: 20,
            })
        ));
    }
}
