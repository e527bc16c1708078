//! Opaque extra bytes codec, one adaptive model per byte position.

pub mod v1 {
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::record::{FieldCompressor, FieldDecompressor};

    pub struct ExtraBytesCompressor {
        count: usize,
        last_bytes: Vec<u8>,
        models: Vec<SymbolModel>,
    }

    impl ExtraBytesCompressor {
        pub fn new(count: usize) -> Self {
            Self {
                count,
                last_bytes: vec![0u8; count],
                models: (0..count).map(|_| SymbolModel::new(256)).collect(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for ExtraBytesCompressor {
        fn size_of_field(&self) -> usize {
            self.count
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last_bytes.copy_from_slice(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            for i in 0..self.count {
                let diff = buf[i].wrapping_sub(self.last_bytes[i]);
                encoder.encode_symbol(&mut self.models[i], u32::from(diff))?;
                self.last_bytes[i] = buf[i];
            }
            Ok(())
        }
    }

    pub struct ExtraBytesDecompressor {
        count: usize,
        last_bytes: Vec<u8>,
        models: Vec<SymbolModel>,
    }

    impl ExtraBytesDecompressor {
        pub fn new(count: usize) -> Self {
            Self {
                count,
                last_bytes: vec![0u8; count],
                models: (0..count).map(|_| SymbolModel::new(256)).collect(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for ExtraBytesDecompressor {
        fn size_of_field(&self) -> usize {
            self.count
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            src.read_exact(first_point)?;
            self.last_bytes.copy_from_slice(first_point);
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            for i in 0..self.count {
                let diff = decoder.decode_symbol(&mut self.models[i])? as u8;
                self.last_bytes[i] = self.last_bytes[i].wrapping_add(diff);
            }
            buf.copy_from_slice(&self.last_bytes);
            Ok(())
        }
    }
}

pub mod v3 {
    //! Same per-byte differencing, with scanner channel contexts and
    //! one layer per byte position.
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::layers::{copy_bytes_into_decoder, copy_encoder_content_to, inner_buffer_len_of};
    use crate::layout::DecompressionSelector;
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};

    struct ExtraBytesContext {
        unused: bool,
        last_bytes: Vec<u8>,
        models: Vec<SymbolModel>,
    }

    impl ExtraBytesContext {
        fn new(count: usize) -> Self {
            Self {
                unused: true,
                last_bytes: vec![0u8; count],
                models: (0..count).map(|_| SymbolModel::new(256)).collect(),
            }
        }
    }

    pub struct ExtraBytesDecompressor {
        // one layer per byte position, each with its own decoder
        decoders: Vec<RangeDecoder<Cursor<Vec<u8>>>>,
        layer_sizes: Vec<u32>,
        has_byte_changed: Vec<bool>,
        requested: bool,
        contexts: Vec<ExtraBytesContext>,
        count: usize,
        last_context_used: usize,
    }

    impl ExtraBytesDecompressor {
        pub fn new(count: usize) -> Self {
            Self::selective(count, DecompressionSelector::all())
        }

        pub fn selective(count: usize, selector: DecompressionSelector) -> Self {
            Self {
                decoders: (0..count)
                    .map(|_| RangeDecoder::new(Cursor::new(Vec::<u8>::new())))
                    .collect(),
                layer_sizes: vec![0; count],
                has_byte_changed: vec![false; count],
                requested: selector.extra_bytes_requested(),
                contexts: (0..4).map(|_| ExtraBytesContext::new(count)).collect(),
                count,
                last_context_used: 0,
            }
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for ExtraBytesDecompressor {
        fn size_of_field(&self) -> usize {
            self.count
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for eb_context in &mut self.contexts {
                eb_context.unused = true;
            }

            src.read_exact(first_point)?;
            let the_context = &mut self.contexts[*context];
            the_context.last_bytes.copy_from_slice(first_point);
            the_context.unused = false;
            self.last_context_used = *context;
            Ok(())
        }

        fn decompress_field_with(
            &mut self,
            current_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    let mut seeded = ExtraBytesContext::new(self.count);
                    seeded
                        .last_bytes
                        .copy_from_slice(&self.contexts[self.last_context_used].last_bytes);
                    seeded.unused = false;
                    self.contexts[*context] = seeded;
                }
                self.last_context_used = *context;
            }

            let the_context = &mut self.contexts[*context];
            for i in 0..self.count {
                if self.has_byte_changed[i] {
                    let diff = self.decoders[i].decode_symbol(&mut the_context.models[i])? as u8;
                    the_context.last_bytes[i] = the_context.last_bytes[i].wrapping_add(diff);
                }
            }
            current_point.copy_from_slice(&the_context.last_bytes);
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            for layer_size in &mut self.layer_sizes {
                *layer_size = src.read_u32::<LittleEndian>()?;
            }
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            for i in 0..self.count {
                self.has_byte_changed[i] = copy_bytes_into_decoder(
                    self.requested,
                    self.layer_sizes[i] as usize,
                    &mut self.decoders[i],
                    src,
                )?;
            }
            Ok(())
        }
    }

    pub struct ExtraBytesCompressor {
        encoders: Vec<RangeEncoder<Cursor<Vec<u8>>>>,
        has_byte_changed: Vec<bool>,
        contexts: Vec<ExtraBytesContext>,
        count: usize,
        last_context_used: usize,
    }

    impl ExtraBytesCompressor {
        pub fn new(count: usize) -> Self {
            Self {
                encoders: (0..count)
                    .map(|_| RangeEncoder::new(Cursor::new(Vec::<u8>::new())))
                    .collect(),
                has_byte_changed: vec![false; count],
                contexts: (0..4).map(|_| ExtraBytesContext::new(count)).collect(),
                count,
                last_context_used: 0,
            }
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for ExtraBytesCompressor {
        fn size_of_field(&self) -> usize {
            self.count
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for eb_context in &mut self.contexts {
                eb_context.unused = true;
            }

            dst.write_all(first_point)?;
            let the_context = &mut self.contexts[*context];
            the_context.last_bytes.copy_from_slice(first_point);
            the_context.unused = false;
            self.last_context_used = *context;
            Ok(())
        }

        fn compress_field_with(&mut self, buf: &[u8], context: &mut usize) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    let mut seeded = ExtraBytesContext::new(self.count);
                    seeded
                        .last_bytes
                        .copy_from_slice(&self.contexts[self.last_context_used].last_bytes);
                    seeded.unused = false;
                    self.contexts[*context] = seeded;
                }
                self.last_context_used = *context;
            }

            let the_context = &mut self.contexts[*context];
            for i in 0..self.count {
                let diff = buf[i].wrapping_sub(the_context.last_bytes[i]);
                self.encoders[i].encode_symbol(&mut the_context.models[i], u32::from(diff))?;
                if diff != 0 {
                    self.has_byte_changed[i] = true;
                    the_context.last_bytes[i] = buf[i];
                }
            }
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            for (encoder, changed) in self.encoders.iter_mut().zip(&self.has_byte_changed) {
                if *changed {
                    encoder.done()?;
                    dst.write_u32::<LittleEndian>(inner_buffer_len_of(encoder) as u32)?;
                } else {
                    dst.write_u32::<LittleEndian>(0)?;
                }
            }
            Ok(())
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            for (encoder, changed) in self.encoders.iter_mut().zip(&self.has_byte_changed) {
                if *changed {
                    copy_encoder_content_to(encoder, dst)?;
                }
            }
            Ok(())
        }
    }
}
