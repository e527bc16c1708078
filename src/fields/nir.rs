//! Near infrared channel codec, layered wire format only.

pub mod v3 {
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::layers::{copy_bytes_into_decoder, copy_encoder_content_to, inner_buffer_len_of};
    use crate::layout::DecompressionSelector;
    use crate::packing::Packable;
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};
    use crate::utils::{lower_byte, u8_fold, upper_byte};

    pub const NIR_SIZE: usize = 2;

    struct NirContext {
        last_nir: u16,
        bytes_used_model: SymbolModel,
        lower_diff_model: SymbolModel,
        upper_diff_model: SymbolModel,
        unused: bool,
    }

    impl NirContext {
        fn from_last(last_nir: u16) -> Self {
            Self {
                last_nir,
                bytes_used_model: SymbolModel::new(4),
                lower_diff_model: SymbolModel::new(256),
                upper_diff_model: SymbolModel::new(256),
                unused: false,
            }
        }

        fn new() -> Self {
            Self::from_last(0)
        }
    }

    pub struct NirDecompressor {
        decoder: RangeDecoder<Cursor<Vec<u8>>>,
        changed_nir: bool,
        requested_nir: bool,
        layer_size: u32,
        last_context_used: usize,
        contexts: [NirContext; 4],
    }

    impl NirDecompressor {
        pub fn new() -> Self {
            Self::selective(DecompressionSelector::all())
        }

        pub fn selective(selector: DecompressionSelector) -> Self {
            Self {
                decoder: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                changed_nir: false,
                requested_nir: selector.nir_requested(),
                layer_size: 0,
                last_context_used: 0,
                contexts: [
                    NirContext::new(),
                    NirContext::new(),
                    NirContext::new(),
                    NirContext::new(),
                ],
            }
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for NirDecompressor {
        fn size_of_field(&self) -> usize {
            NIR_SIZE
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for nir_context in &mut self.contexts {
                nir_context.unused = true;
            }

            let nir = src.read_u16::<LittleEndian>()?;
            self.contexts[*context] = NirContext::from_last(nir);
            nir.pack_into(first_point);

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
                    let last_nir = self.contexts[self.last_context_used].last_nir;
                    self.contexts[*context] = NirContext::from_last(last_nir);
                }
                self.last_context_used = *context;
            }

            let the_context = &mut self.contexts[*context];

            if self.changed_nir {
                let sym = self.decoder.decode_symbol(&mut the_context.bytes_used_model)?;

                let mut new_nir: u16;
                if sym & (1 << 0) != 0 {
                    let corr = self.decoder.decode_symbol(&mut the_context.lower_diff_model)? as i32;
                    new_nir = u16::from(u8_fold(corr + i32::from(lower_byte(the_context.last_nir))));
                } else {
                    new_nir = the_context.last_nir & 0x00FF;
                }

                if sym & (1 << 1) != 0 {
                    let corr = self.decoder.decode_symbol(&mut the_context.upper_diff_model)? as i32;
                    new_nir |= u16::from(u8_fold(corr + i32::from(upper_byte(the_context.last_nir))))
                        << 8;
                } else {
                    new_nir |= the_context.last_nir & 0xFF00;
                }
                the_context.last_nir = new_nir;
            }

            the_context.last_nir.pack_into(current_point);
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            self.layer_size = src.read_u32::<LittleEndian>()?;
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            self.changed_nir = copy_bytes_into_decoder(
                self.requested_nir,
                self.layer_size as usize,
                &mut self.decoder,
                src,
            )?;
            Ok(())
        }
    }

    pub struct NirCompressor {
        encoder: RangeEncoder<Cursor<Vec<u8>>>,
        nir_has_changed: bool,
        last_context_used: usize,
        contexts: [NirContext; 4],
    }

    impl NirCompressor {
        pub fn new() -> Self {
            Self {
                encoder: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                nir_has_changed: false,
                last_context_used: 0,
                contexts: [
                    NirContext::new(),
                    NirContext::new(),
                    NirContext::new(),
                    NirContext::new(),
                ],
            }
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for NirCompressor {
        fn size_of_field(&self) -> usize {
            NIR_SIZE
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for nir_context in &mut self.contexts {
                nir_context.unused = true;
            }
            let nir = u16::unpack_from(first_point);
            dst.write_u16::<LittleEndian>(nir)?;
            self.contexts[*context] = NirContext::from_last(nir);
            self.last_context_used = *context;
            Ok(())
        }

        fn compress_field_with(&mut self, buf: &[u8], context: &mut usize) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].unused {
                    let last_nir = self.contexts[self.last_context_used].last_nir;
                    self.contexts[*context] = NirContext::from_last(last_nir);
                }
                self.last_context_used = *context;
            }

            let current = u16::unpack_from(buf);
            let the_context = &mut self.contexts[*context];

            if current != the_context.last_nir {
                self.nir_has_changed = true;
            }

            let lower_changed = lower_byte(current) != lower_byte(the_context.last_nir);
            let upper_changed = upper_byte(current) != upper_byte(the_context.last_nir);
            let sym = lower_changed as u32 | (upper_changed as u32) << 1;
            self.encoder
                .encode_symbol(&mut the_context.bytes_used_model, sym)?;

            if lower_changed {
                let corr = i32::from(lower_byte(current))
                    - i32::from(lower_byte(the_context.last_nir));
                self.encoder
                    .encode_symbol(&mut the_context.lower_diff_model, u32::from(u8_fold(corr)))?;
            }
            if upper_changed {
                let corr = i32::from(upper_byte(current))
                    - i32::from(upper_byte(the_context.last_nir));
                self.encoder
                    .encode_symbol(&mut the_context.upper_diff_model, u32::from(u8_fold(corr)))?;
            }
            the_context.last_nir = current;
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.nir_has_changed {
                self.encoder.done()?;
                dst.write_u32::<LittleEndian>(inner_buffer_len_of(&self.encoder) as u32)?;
            } else {
                dst.write_u32::<LittleEndian>(0)?;
            }
            Ok(())
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.nir_has_changed {
                copy_encoder_content_to(&mut self.encoder, dst)?;
            }
            Ok(())
        }
    }
}
