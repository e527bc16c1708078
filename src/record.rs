//! Record compressors and decompressors.
//!
//! A record codec chains one field codec per field of the layout. Two
//! families exist: pointwise codecs interleave every field in a single
//! arithmetic stream, layered codecs give each attribute group its own
//! substream which is written after the chunk's points.

use std::io::{Read, Seek, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::entropy::{RangeDecoder, RangeEncoder};
use crate::layout::{DecompressionSelector, FieldDescriptor, FieldKind, RecordLayout};
use crate::Error;

pub trait FieldCompressor<W: Write> {
    fn size_of_field(&self) -> usize;

    /// First record of a chunk, written raw.
    fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()>;

    fn compress_with(&mut self, encoder: &mut RangeEncoder<W>, buf: &[u8])
        -> std::io::Result<()>;
}

pub trait FieldDecompressor<R: Read> {
    fn size_of_field(&self) -> usize;

    fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()>;

    fn decompress_with(
        &mut self,
        decoder: &mut RangeDecoder<R>,
        buf: &mut [u8],
    ) -> std::io::Result<()>;
}

pub trait LayeredFieldCompressor<W: Write> {
    fn size_of_field(&self) -> usize;

    fn init_first_point(
        &mut self,
        dst: &mut W,
        first_point: &[u8],
        context: &mut usize,
    ) -> std::io::Result<()>;

    fn compress_field_with(
        &mut self,
        current_point: &[u8],
        context: &mut usize,
    ) -> std::io::Result<()>;

    fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()>;
    fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()>;
}

pub trait LayeredFieldDecompressor<R: Read> {
    fn size_of_field(&self) -> usize;

    fn init_first_point(
        &mut self,
        src: &mut R,
        first_point: &mut [u8],
        context: &mut usize,
    ) -> std::io::Result<()>;

    fn decompress_field_with(
        &mut self,
        current_point: &mut [u8],
        context: &mut usize,
    ) -> std::io::Result<()>;

    fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()>;
    fn read_layers(&mut self, src: &mut R) -> std::io::Result<()>;
}

pub trait RecordCompressor<W> {
    fn set_fields_from(&mut self, fields: &[FieldDescriptor]) -> crate::Result<()>;
    fn record_size(&self) -> usize;

    fn compress_next(&mut self, input: &[u8]) -> std::io::Result<()>;
    /// Flushes the chunk. The compressor is ready for a new chunk after
    /// `reset` + `set_fields_from`.
    fn done(&mut self) -> std::io::Result<()>;
    fn reset(&mut self);

    fn borrow_stream_mut(&mut self) -> &mut W;
    fn into_stream(self) -> W
    where
        Self: Sized;
    fn box_into_stream(self: Box<Self>) -> W;
}

pub trait RecordDecompressor<R> {
    fn set_fields_from(
        &mut self,
        fields: &[FieldDescriptor],
        selector: DecompressionSelector,
    ) -> crate::Result<()>;
    fn record_size(&self) -> usize;

    fn decompress_next(&mut self, out: &mut [u8]) -> std::io::Result<()>;
    fn reset(&mut self);

    fn borrow_stream_mut(&mut self) -> &mut R;
    fn into_stream(self) -> R
    where
        Self: Sized;
    fn box_into_stream(self: Box<Self>) -> R;
}

/// Compressor for the pointwise (versions 1 and 2) field codecs.
///
/// Chunk layout: one raw record, then all following records interleaved
/// in a single arithmetic stream.
pub struct PointwiseRecordCompressor<W: Write> {
    is_first_compression: bool,
    field_compressors: Vec<Box<dyn FieldCompressor<W>>>,
    encoder: RangeEncoder<W>,
    record_size: usize,
}

impl<W: Write> PointwiseRecordCompressor<W> {
    pub fn new(output: W) -> Self {
        Self {
            is_first_compression: true,
            field_compressors: vec![],
            encoder: RangeEncoder::new(output),
            record_size: 0,
        }
    }

    pub fn add_field_compressor<T: 'static + FieldCompressor<W>>(&mut self, field: T) {
        self.record_size += field.size_of_field();
        self.field_compressors.push(Box::new(field));
    }
}

impl<W: Write> RecordCompressor<W> for PointwiseRecordCompressor<W> {
    fn set_fields_from(&mut self, fields: &[FieldDescriptor]) -> crate::Result<()> {
        for field in fields {
            match field.version() {
                1 => match field.kind() {
                    FieldKind::Core => {
                        self.add_field_compressor(fields_v1::CoreCompressor::new())
                    }
                    FieldKind::GpsTime => {
                        self.add_field_compressor(fields_v1::GpsTimeCompressor::new())
                    }
                    FieldKind::Rgb => self.add_field_compressor(fields_v1::RgbCompressor::new()),
                    FieldKind::WavePacket => {
                        self.add_field_compressor(fields_v1::WavePacketCompressor::new())
                    }
                    FieldKind::ExtraBytes(count) => self.add_field_compressor(
                        fields_v1::ExtraBytesCompressor::new(usize::from(count)),
                    ),
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                2 => match field.kind() {
                    FieldKind::Core => {
                        self.add_field_compressor(fields_v2::CoreCompressor::new())
                    }
                    FieldKind::GpsTime => {
                        self.add_field_compressor(fields_v2::GpsTimeCompressor::new())
                    }
                    FieldKind::Rgb => self.add_field_compressor(fields_v2::RgbCompressor::new()),
                    FieldKind::WavePacket => {
                        self.add_field_compressor(fields_v1::WavePacketCompressor::new())
                    }
                    FieldKind::ExtraBytes(count) => self.add_field_compressor(
                        fields_v2::ExtraBytesCompressor::new(usize::from(count)),
                    ),
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                version => return Err(Error::UnsupportedFieldVersion(field.kind(), version)),
            }
        }
        Ok(())
    }

    fn record_size(&self) -> usize {
        self.record_size
    }

    fn compress_next(&mut self, input: &[u8]) -> std::io::Result<()> {
        let mut field_start = 0;
        if self.is_first_compression {
            for field in &mut self.field_compressors {
                let field_end = field_start + field.size_of_field();
                field.compress_first(self.encoder.get_mut(), &input[field_start..field_end])?;
                field_start = field_end;
            }
            self.is_first_compression = false;
        } else {
            for field in &mut self.field_compressors {
                let field_end = field_start + field.size_of_field();
                field.compress_with(&mut self.encoder, &input[field_start..field_end])?;
                field_start = field_end;
            }
        }
        Ok(())
    }

    fn done(&mut self) -> std::io::Result<()> {
        self.encoder.done()
    }

    fn reset(&mut self) {
        self.is_first_compression = true;
        self.encoder.reset();
        self.field_compressors.clear();
        self.record_size = 0;
    }

    fn borrow_stream_mut(&mut self) -> &mut W {
        self.encoder.get_mut()
    }

    fn into_stream(self) -> W {
        self.encoder.into_inner()
    }

    fn box_into_stream(self: Box<Self>) -> W {
        self.encoder.into_inner()
    }
}

/// Decompressor matching [PointwiseRecordCompressor].
pub struct PointwiseRecordDecompressor<R: Read> {
    field_decompressors: Vec<Box<dyn FieldDecompressor<R>>>,
    decoder: RangeDecoder<R>,
    is_first_decompression: bool,
    record_size: usize,
}

impl<R: Read> PointwiseRecordDecompressor<R> {
    pub fn new(input: R) -> Self {
        Self {
            field_decompressors: vec![],
            decoder: RangeDecoder::new(input),
            is_first_decompression: true,
            record_size: 0,
        }
    }

    pub fn add_field_decompressor<T: 'static + FieldDecompressor<R>>(&mut self, field: T) {
        self.record_size += field.size_of_field();
        self.field_decompressors.push(Box::new(field));
    }
}

impl<R: Read> RecordDecompressor<R> for PointwiseRecordDecompressor<R> {
    fn set_fields_from(
        &mut self,
        fields: &[FieldDescriptor],
        _selector: DecompressionSelector,
    ) -> crate::Result<()> {
        // pointwise streams cannot skip anything, the selector is moot
        for field in fields {
            match field.version() {
                1 => match field.kind() {
                    FieldKind::Core => {
                        self.add_field_decompressor(fields_v1::CoreDecompressor::new())
                    }
                    FieldKind::GpsTime => {
                        self.add_field_decompressor(fields_v1::GpsTimeDecompressor::new())
                    }
                    FieldKind::Rgb => {
                        self.add_field_decompressor(fields_v1::RgbDecompressor::new())
                    }
                    FieldKind::WavePacket => {
                        self.add_field_decompressor(fields_v1::WavePacketDecompressor::new())
                    }
                    FieldKind::ExtraBytes(count) => self.add_field_decompressor(
                        fields_v1::ExtraBytesDecompressor::new(usize::from(count)),
                    ),
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                2 => match field.kind() {
                    FieldKind::Core => {
                        self.add_field_decompressor(fields_v2::CoreDecompressor::new())
                    }
                    FieldKind::GpsTime => {
                        self.add_field_decompressor(fields_v2::GpsTimeDecompressor::new())
                    }
                    FieldKind::Rgb => {
                        self.add_field_decompressor(fields_v2::RgbDecompressor::new())
                    }
                    FieldKind::WavePacket => {
                        self.add_field_decompressor(fields_v1::WavePacketDecompressor::new())
                    }
                    FieldKind::ExtraBytes(count) => self.add_field_decompressor(
                        fields_v2::ExtraBytesDecompressor::new(usize::from(count)),
                    ),
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                version => return Err(Error::UnsupportedFieldVersion(field.kind(), version)),
            }
        }
        Ok(())
    }

    fn record_size(&self) -> usize {
        self.record_size
    }

    fn decompress_next(&mut self, out: &mut [u8]) -> std::io::Result<()> {
        let mut field_start = 0;
        if self.is_first_decompression {
            for field in &mut self.field_decompressors {
                let field_end = field_start + field.size_of_field();
                field.decompress_first(self.decoder.get_mut(), &mut out[field_start..field_end])?;
                field_start = field_end;
            }
            self.is_first_decompression = false;
            // the arithmetic stream starts after the raw first record
            self.decoder.read_init_bytes()?;
        } else {
            for field in &mut self.field_decompressors {
                let field_end = field_start + field.size_of_field();
                field.decompress_with(&mut self.decoder, &mut out[field_start..field_end])?;
                field_start = field_end;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.decoder.reset();
        self.is_first_decompression = true;
        self.field_decompressors.clear();
        self.record_size = 0;
    }

    fn borrow_stream_mut(&mut self) -> &mut R {
        self.decoder.get_mut()
    }

    fn into_stream(self) -> R {
        self.decoder.into_inner()
    }

    fn box_into_stream(self: Box<Self>) -> R {
        self.decoder.into_inner()
    }
}

/// Compressor for the layered (version 3) field codecs.
///
/// Chunk layout: one raw record, then on `done` the point count, the
/// byte size of every layer, and finally the layers themselves.
pub struct LayeredRecordCompressor<W: Write> {
    field_compressors: Vec<Box<dyn LayeredFieldCompressor<W>>>,
    record_size: usize,
    point_count: u32,
    dst: W,
}

impl<W: Write> LayeredRecordCompressor<W> {
    pub fn new(dst: W) -> Self {
        Self {
            field_compressors: vec![],
            record_size: 0,
            point_count: 0,
            dst,
        }
    }

    pub fn add_field_compressor<T: 'static + LayeredFieldCompressor<W>>(&mut self, field: T) {
        self.record_size += field.size_of_field();
        self.field_compressors.push(Box::new(field));
    }
}

impl<W: Write> RecordCompressor<W> for LayeredRecordCompressor<W> {
    fn set_fields_from(&mut self, fields: &[FieldDescriptor]) -> crate::Result<()> {
        for field in fields {
            match field.version() {
                3 => match field.kind() {
                    FieldKind::Extended => {
                        self.add_field_compressor(fields_v3::ExtendedCompressor::new())
                    }
                    FieldKind::ExtendedRgb => {
                        self.add_field_compressor(fields_v3::RgbCompressor::new())
                    }
                    FieldKind::ExtendedRgbNir => {
                        self.add_field_compressor(fields_v3::RgbCompressor::new());
                        self.add_field_compressor(fields_v3::NirCompressor::new());
                    }
                    FieldKind::ExtendedWavePacket => {
                        self.add_field_compressor(fields_v3::WavePacketCompressor::new())
                    }
                    FieldKind::ExtendedExtraBytes(count) => self.add_field_compressor(
                        fields_v3::ExtraBytesCompressor::new(usize::from(count)),
                    ),
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                version => return Err(Error::UnsupportedFieldVersion(field.kind(), version)),
            }
        }
        Ok(())
    }

    fn record_size(&self) -> usize {
        self.record_size
    }

    fn compress_next(&mut self, point: &[u8]) -> std::io::Result<()> {
        let mut context = 0usize;
        let mut field_start = 0;
        if self.point_count == 0 {
            for field in &mut self.field_compressors {
                let field_end = field_start + field.size_of_field();
                field.init_first_point(
                    &mut self.dst,
                    &point[field_start..field_end],
                    &mut context,
                )?;
                field_start = field_end;
            }
        } else {
            for field in &mut self.field_compressors {
                let field_end = field_start + field.size_of_field();
                field.compress_field_with(&point[field_start..field_end], &mut context)?;
                field_start = field_end;
            }
        }
        self.point_count += 1;
        Ok(())
    }

    fn done(&mut self) -> std::io::Result<()> {
        if self.point_count > 0 {
            self.dst.write_u32::<LittleEndian>(self.point_count)?;
            for field in &mut self.field_compressors {
                field.write_layers_sizes(&mut self.dst)?;
            }
            for field in &mut self.field_compressors {
                field.write_layers(&mut self.dst)?;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.point_count = 0;
        self.record_size = 0;
        self.field_compressors.clear();
    }

    fn borrow_stream_mut(&mut self) -> &mut W {
        &mut self.dst
    }

    fn into_stream(self) -> W {
        self.dst
    }

    fn box_into_stream(self: Box<Self>) -> W {
        self.dst
    }
}

/// Decompressor matching [LayeredRecordCompressor].
///
/// Needs `Seek` to be able to hop over layers the selector excludes.
pub struct LayeredRecordDecompressor<R: Read + Seek> {
    field_decompressors: Vec<Box<dyn LayeredFieldDecompressor<R>>>,
    input: R,
    is_first_decompression: bool,
    record_size: usize,
    context: usize,
}

impl<R: Read + Seek> LayeredRecordDecompressor<R> {
    pub fn new(input: R) -> Self {
        Self {
            field_decompressors: vec![],
            input,
            is_first_decompression: true,
            record_size: 0,
            context: 0,
        }
    }

    pub fn add_field_decompressor<T: 'static + LayeredFieldDecompressor<R>>(&mut self, field: T) {
        self.record_size += field.size_of_field();
        self.field_decompressors.push(Box::new(field));
    }
}

impl<R: Read + Seek> RecordDecompressor<R> for LayeredRecordDecompressor<R> {
    fn set_fields_from(
        &mut self,
        fields: &[FieldDescriptor],
        selector: DecompressionSelector,
    ) -> crate::Result<()> {
        for field in fields {
            match field.version() {
                3 => match field.kind() {
                    FieldKind::Extended => self.add_field_decompressor(
                        fields_v3::ExtendedDecompressor::selective(selector),
                    ),
                    FieldKind::ExtendedRgb => self
                        .add_field_decompressor(fields_v3::RgbDecompressor::selective(selector)),
                    FieldKind::ExtendedRgbNir => {
                        self.add_field_decompressor(fields_v3::RgbDecompressor::selective(
                            selector,
                        ));
                        self.add_field_decompressor(fields_v3::NirDecompressor::selective(
                            selector,
                        ));
                    }
                    FieldKind::ExtendedWavePacket => self.add_field_decompressor(
                        fields_v3::WavePacketDecompressor::selective(selector),
                    ),
                    FieldKind::ExtendedExtraBytes(count) => {
                        self.add_field_decompressor(fields_v3::ExtraBytesDecompressor::selective(
                            usize::from(count),
                            selector,
                        ))
                    }
                    kind => return Err(Error::UnsupportedFieldVersion(kind, field.version())),
                },
                version => return Err(Error::UnsupportedFieldVersion(field.kind(), version)),
            }
        }
        Ok(())
    }

    fn record_size(&self) -> usize {
        self.record_size
    }

    fn decompress_next(&mut self, out: &mut [u8]) -> std::io::Result<()> {
        let mut field_start = 0;
        if self.is_first_decompression {
            for field in &mut self.field_decompressors {
                let field_end = field_start + field.size_of_field();
                field.init_first_point(
                    &mut self.input,
                    &mut out[field_start..field_end],
                    &mut self.context,
                )?;
                field_start = field_end;
            }

            let _count = self.input.read_u32::<LittleEndian>()?;
            for field in &mut self.field_decompressors {
                field.read_layers_sizes(&mut self.input)?;
            }
            for field in &mut self.field_decompressors {
                field.read_layers(&mut self.input)?;
            }
            self.is_first_decompression = false;
        } else {
            for field in &mut self.field_decompressors {
                let field_end = field_start + field.size_of_field();
                field.decompress_field_with(&mut out[field_start..field_end], &mut self.context)?;
                field_start = field_end;
            }
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.is_first_decompression = true;
        self.field_decompressors.clear();
        self.record_size = 0;
        self.context = 0;
    }

    fn borrow_stream_mut(&mut self) -> &mut R {
        &mut self.input
    }

    fn into_stream(self) -> R {
        self.input
    }

    fn box_into_stream(self: Box<Self>) -> R {
        self.input
    }
}

use crate::fields::v1 as fields_v1;
use crate::fields::v2 as fields_v2;
use crate::fields::v3 as fields_v3;

fn check_layout(layout: &RecordLayout) -> crate::Result<()> {
    let fields = layout.fields();
    if fields.is_empty() {
        return Err(Error::EmptyLayout);
    }
    let layered = layout.is_layered();
    if fields.iter().any(|f| (f.version() >= 3) != layered) {
        return Err(Error::MixedFieldVersions);
    }
    Ok(())
}

/// Picks the record compressor family the layout's versions call for.
pub fn record_compressor_from_layout<'a, W: Write + 'a>(
    dst: W,
    layout: &RecordLayout,
) -> crate::Result<Box<dyn RecordCompressor<W> + 'a>> {
    check_layout(layout)?;
    let mut compressor: Box<dyn RecordCompressor<W> + 'a> = if layout.is_layered() {
        Box::new(LayeredRecordCompressor::new(dst))
    } else {
        Box::new(PointwiseRecordCompressor::new(dst))
    };
    compressor.set_fields_from(layout.fields())?;
    Ok(compressor)
}

/// Picks the record decompressor family the layout's versions call for.
pub fn record_decompressor_from_layout<'a, R: Read + Seek + 'a>(
    src: R,
    layout: &RecordLayout,
    selector: DecompressionSelector,
) -> crate::Result<Box<dyn RecordDecompressor<R> + 'a>> {
    check_layout(layout)?;
    let mut decompressor: Box<dyn RecordDecompressor<R> + 'a> = if layout.is_layered() {
        Box::new(LayeredRecordDecompressor::new(src))
    } else {
        Box::new(PointwiseRecordDecompressor::new(src))
    };
    decompressor.set_fields_from(layout.fields(), selector)?;
    Ok(decompressor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn empty_layout_is_rejected() {
        let layout = RecordLayout::new();
        let result = record_compressor_from_layout(Cursor::new(Vec::new()), &layout);
        assert!(matches!(result, Err(Error::EmptyLayout)));
    }

    #[test]
    fn mixed_versions_are_rejected() {
        let layout = RecordLayout::new()
            .with_field(FieldKind::Extended)
            .with_field(FieldKind::Rgb);
        let result = record_compressor_from_layout(Cursor::new(Vec::new()), &layout);
        assert!(matches!(result, Err(Error::MixedFieldVersions)));

        let result = record_decompressor_from_layout(
            Cursor::new(Vec::new()),
            &layout,
            DecompressionSelector::all(),
        );
        assert!(matches!(result, Err(Error::MixedFieldVersions)));
    }

    #[test]
    fn streams_do_not_have_to_be_send() {
        struct RcWriter {
            inner: Cursor<Vec<u8>>,
            _handle: std::rc::Rc<()>,
        }

        impl std::io::Write for RcWriter {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.inner.write(buf)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                self.inner.flush()
            }
        }

        let layout = RecordLayout::for_point_format(1, 0).unwrap();
        let dst = RcWriter {
            inner: Cursor::new(Vec::new()),
            _handle: std::rc::Rc::new(()),
        };
        let compressor = record_compressor_from_layout(dst, &layout).unwrap();
        assert_eq!(compressor.record_size(), 28);
    }

    #[test]
    fn family_follows_versions() {
        let pointwise = RecordLayout::for_point_format(3, 0).unwrap();
        let compressor =
            record_compressor_from_layout(Cursor::new(Vec::new()), &pointwise).unwrap();
        assert_eq!(compressor.record_size(), 34);

        let layered = RecordLayout::for_point_format(8, 2).unwrap();
        let compressor = record_compressor_from_layout(Cursor::new(Vec::new()), &layered).unwrap();
        assert_eq!(compressor.record_size(), 40);
    }
}
