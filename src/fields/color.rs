//! RGB color codecs.

use crate::packing::Packable;
use crate::utils::{lower_byte_changed, upper_byte_changed};

#[derive(Default, Copy, Clone, Debug, PartialEq)]
pub struct Rgb {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Rgb {
    pub const SIZE: usize = 6;
}

impl Packable for Rgb {
    fn unpack_from(input: &[u8]) -> Self {
        Self {
            red: u16::unpack_from(&input[0..2]),
            green: u16::unpack_from(&input[2..4]),
            blue: u16::unpack_from(&input[4..6]),
        }
    }

    fn pack_into(&self, output: &mut [u8]) {
        self.red.pack_into(&mut output[0..2]);
        self.green.pack_into(&mut output[2..4]);
        self.blue.pack_into(&mut output[4..6]);
    }
}

/// Bit map of which color bytes changed since the last point.
///
/// Bit 6 flags that red, green and blue are not all the same value.
struct ColorDiff(u8);

impl ColorDiff {
    fn from_points(current: &Rgb, last: &Rgb) -> Self {
        let v = (lower_byte_changed(last.red, current.red) as u8)
            | (upper_byte_changed(last.red, current.red) as u8) << 1
            | (lower_byte_changed(last.green, current.green) as u8) << 2
            | (upper_byte_changed(last.green, current.green) as u8) << 3
            | (lower_byte_changed(last.blue, current.blue) as u8) << 4
            | (upper_byte_changed(last.blue, current.blue) as u8) << 5
            | ((lower_byte_changed(current.red, current.green)
                || lower_byte_changed(current.red, current.blue)
                || upper_byte_changed(current.red, current.green)
                || upper_byte_changed(current.red, current.blue)) as u8)
                << 6;
        Self(v)
    }

    fn new(v: u8) -> Self {
        Self(v)
    }

    fn lower_red_byte_changed(&self) -> bool {
        self.0 & (1 << 0) != 0
    }

    fn upper_red_byte_changed(&self) -> bool {
        self.0 & (1 << 1) != 0
    }

    fn lower_green_byte_changed(&self) -> bool {
        self.0 & (1 << 2) != 0
    }

    fn upper_green_byte_changed(&self) -> bool {
        self.0 & (1 << 3) != 0
    }

    fn lower_blue_byte_changed(&self) -> bool {
        self.0 & (1 << 4) != 0
    }

    fn upper_blue_byte_changed(&self) -> bool {
        self.0 & (1 << 5) != 0
    }

    fn colors_are_correlated(&self) -> bool {
        self.0 & (1 << 6) != 0
    }
}

pub mod v1 {
    //! Each of the 6 color bytes is coded with the integer predictor
    //! under its own context, preceded by a symbol saying which bytes
    //! changed at all.
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::{read_and_unpack, Packable};
    use crate::predictor::{IntCompressor, IntDecompressor};
    use crate::record::{FieldCompressor, FieldDecompressor};
    use crate::utils::{lower_byte, upper_byte};

    use super::{ColorDiff, Rgb};

    const LOWER_RED_BYTE_CONTEXT: u32 = 0;
    const UPPER_RED_BYTE_CONTEXT: u32 = 1;
    const LOWER_GREEN_BYTE_CONTEXT: u32 = 2;
    const UPPER_GREEN_BYTE_CONTEXT: u32 = 3;
    const LOWER_BLUE_BYTE_CONTEXT: u32 = 4;
    const UPPER_BLUE_BYTE_CONTEXT: u32 = 5;

    pub struct RgbCompressor {
        last: Rgb,
        byte_used_model: SymbolModel,
        ic_byte: IntCompressor,
    }

    impl RgbCompressor {
        pub fn new() -> Self {
            Self {
                last: Default::default(),
                byte_used_model: SymbolModel::new(64),
                // bytes are coded one at a time, one context per byte
                ic_byte: IntCompressor::initialized(8, 6),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for RgbCompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = Rgb::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = Rgb::unpack_from(buf);
            let sym = ((lower_byte(self.last.red) != lower_byte(current.red)) as u8)
                | ((upper_byte(self.last.red) != upper_byte(current.red)) as u8) << 1
                | ((lower_byte(self.last.green) != lower_byte(current.green)) as u8) << 2
                | ((upper_byte(self.last.green) != upper_byte(current.green)) as u8) << 3
                | ((lower_byte(self.last.blue) != lower_byte(current.blue)) as u8) << 4
                | ((upper_byte(self.last.blue) != upper_byte(current.blue)) as u8) << 5;

            encoder.encode_symbol(&mut self.byte_used_model, u32::from(sym))?;
            let color_diff = ColorDiff::new(sym);

            if color_diff.lower_red_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(lower_byte(self.last.red)),
                    i32::from(lower_byte(current.red)),
                    LOWER_RED_BYTE_CONTEXT,
                )?;
            }
            if color_diff.upper_red_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(upper_byte(self.last.red)),
                    i32::from(upper_byte(current.red)),
                    UPPER_RED_BYTE_CONTEXT,
                )?;
            }
            if color_diff.lower_green_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(lower_byte(self.last.green)),
                    i32::from(lower_byte(current.green)),
                    LOWER_GREEN_BYTE_CONTEXT,
                )?;
            }
            if color_diff.upper_green_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(upper_byte(self.last.green)),
                    i32::from(upper_byte(current.green)),
                    UPPER_GREEN_BYTE_CONTEXT,
                )?;
            }
            if color_diff.lower_blue_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(lower_byte(self.last.blue)),
                    i32::from(lower_byte(current.blue)),
                    LOWER_BLUE_BYTE_CONTEXT,
                )?;
            }
            if color_diff.upper_blue_byte_changed() {
                self.ic_byte.compress(
                    encoder,
                    i32::from(upper_byte(self.last.blue)),
                    i32::from(upper_byte(current.blue)),
                    UPPER_BLUE_BYTE_CONTEXT,
                )?;
            }
            self.last = current;
            Ok(())
        }
    }

    pub struct RgbDecompressor {
        last: Rgb,
        byte_used_model: SymbolModel,
        ic_byte: IntDecompressor,
    }

    impl RgbDecompressor {
        pub fn new() -> Self {
            Self {
                last: Default::default(),
                byte_used_model: SymbolModel::new(64),
                ic_byte: IntDecompressor::initialized(8, 6),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for RgbDecompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            self.last = read_and_unpack::<_, Rgb>(src, first_point)?;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let color_diff = ColorDiff::new(decoder.decode_symbol(&mut self.byte_used_model)? as u8);

            if color_diff.lower_red_byte_changed() {
                let lower = self.ic_byte.decompress(
                    decoder,
                    i32::from(lower_byte(self.last.red)),
                    LOWER_RED_BYTE_CONTEXT,
                )? as u16;
                self.last.red = lower | (self.last.red & 0xFF00);
            }
            if color_diff.upper_red_byte_changed() {
                let upper = self.ic_byte.decompress(
                    decoder,
                    i32::from(upper_byte(self.last.red)),
                    UPPER_RED_BYTE_CONTEXT,
                )? as u16;
                self.last.red = (upper << 8) | (self.last.red & 0x00FF);
            }
            if color_diff.lower_green_byte_changed() {
                let lower = self.ic_byte.decompress(
                    decoder,
                    i32::from(lower_byte(self.last.green)),
                    LOWER_GREEN_BYTE_CONTEXT,
                )? as u16;
                self.last.green = lower | (self.last.green & 0xFF00);
            }
            if color_diff.upper_green_byte_changed() {
                let upper = self.ic_byte.decompress(
                    decoder,
                    i32::from(upper_byte(self.last.green)),
                    UPPER_GREEN_BYTE_CONTEXT,
                )? as u16;
                self.last.green = (upper << 8) | (self.last.green & 0x00FF);
            }
            if color_diff.lower_blue_byte_changed() {
                let lower = self.ic_byte.decompress(
                    decoder,
                    i32::from(lower_byte(self.last.blue)),
                    LOWER_BLUE_BYTE_CONTEXT,
                )? as u16;
                self.last.blue = lower | (self.last.blue & 0xFF00);
            }
            if color_diff.upper_blue_byte_changed() {
                let upper = self.ic_byte.decompress(
                    decoder,
                    i32::from(upper_byte(self.last.blue)),
                    UPPER_BLUE_BYTE_CONTEXT,
                )? as u16;
                self.last.blue = (upper << 8) | (self.last.blue & 0x00FF);
            }
            self.last.pack_into(buf);
            Ok(())
        }
    }
}

pub mod v2 {
    //! Byte differences are modeled directly, and when the three colors
    //! correlate the green and blue bytes are predicted from the red
    //! difference.
    use std::io::{Read, Write};

    use crate::entropy::{RangeDecoder, RangeEncoder, SymbolModel};
    use crate::packing::{read_and_unpack, Packable};
    use crate::record::{FieldCompressor, FieldDecompressor};
    use crate::utils::{lower_byte, u8_clamp, upper_byte};

    use super::{ColorDiff, Rgb};

    pub(crate) struct RgbModels {
        byte_used: SymbolModel,
        lower_red_byte: SymbolModel,
        upper_red_byte: SymbolModel,
        lower_green_byte: SymbolModel,
        upper_green_byte: SymbolModel,
        lower_blue_byte: SymbolModel,
        upper_blue_byte: SymbolModel,
    }

    impl Default for RgbModels {
        fn default() -> Self {
            Self {
                byte_used: SymbolModel::new(128),
                lower_red_byte: SymbolModel::new(256),
                upper_red_byte: SymbolModel::new(256),
                lower_green_byte: SymbolModel::new(256),
                upper_green_byte: SymbolModel::new(256),
                lower_blue_byte: SymbolModel::new(256),
                upper_blue_byte: SymbolModel::new(256),
            }
        }
    }

    pub(crate) fn compress_rgb_using<W: Write>(
        encoder: &mut RangeEncoder<W>,
        models: &mut RgbModels,
        current: &Rgb,
        last: &Rgb,
    ) -> std::io::Result<()> {
        let mut diff_l = 0i32;
        let mut diff_h = 0i32;

        let color_diff = ColorDiff::from_points(current, last);
        encoder.encode_symbol(&mut models.byte_used, u32::from(color_diff.0))?;

        if color_diff.lower_red_byte_changed() {
            diff_l = i32::from(lower_byte(current.red)) - i32::from(lower_byte(last.red));
            encoder.encode_symbol(&mut models.lower_red_byte, diff_l as u8 as u32)?;
        }
        if color_diff.upper_red_byte_changed() {
            diff_h = i32::from(upper_byte(current.red)) - i32::from(upper_byte(last.red));
            encoder.encode_symbol(&mut models.upper_red_byte, diff_h as u8 as u32)?;
        }

        if color_diff.colors_are_correlated() {
            if color_diff.lower_green_byte_changed() {
                let corr = i32::from(lower_byte(current.green))
                    - i32::from(u8_clamp(diff_l + i32::from(lower_byte(last.green))));
                encoder.encode_symbol(&mut models.lower_green_byte, corr as u8 as u32)?;
            }
            if color_diff.lower_blue_byte_changed() {
                diff_l = (diff_l + i32::from(lower_byte(current.green))
                    - i32::from(lower_byte(last.green)))
                    / 2;
                let corr = i32::from(lower_byte(current.blue))
                    - i32::from(u8_clamp(diff_l + i32::from(lower_byte(last.blue))));
                encoder.encode_symbol(&mut models.lower_blue_byte, corr as u8 as u32)?;
            }
            if color_diff.upper_green_byte_changed() {
                let corr = i32::from(upper_byte(current.green))
                    - i32::from(u8_clamp(diff_h + i32::from(upper_byte(last.green))));
                encoder.encode_symbol(&mut models.upper_green_byte, corr as u8 as u32)?;
            }
            if color_diff.upper_blue_byte_changed() {
                diff_h = (diff_h + i32::from(upper_byte(current.green))
                    - i32::from(upper_byte(last.green)))
                    / 2;
                let corr = i32::from(upper_byte(current.blue))
                    - i32::from(u8_clamp(diff_h + i32::from(upper_byte(last.blue))));
                encoder.encode_symbol(&mut models.upper_blue_byte, corr as u8 as u32)?;
            }
        }
        Ok(())
    }

    pub(crate) fn decompress_rgb_using<R: Read>(
        decoder: &mut RangeDecoder<R>,
        models: &mut RgbModels,
        last: &Rgb,
    ) -> std::io::Result<Rgb> {
        let color_diff = ColorDiff::new(decoder.decode_symbol(&mut models.byte_used)? as u8);

        let mut current = Rgb::default();

        if color_diff.lower_red_byte_changed() {
            let corr = decoder.decode_symbol(&mut models.lower_red_byte)? as u8;
            current.red = u16::from(corr.wrapping_add(lower_byte(last.red)));
        } else {
            current.red = last.red & 0x00FF;
        }

        if color_diff.upper_red_byte_changed() {
            let corr = decoder.decode_symbol(&mut models.upper_red_byte)? as u8;
            current.red |= u16::from(corr.wrapping_add(upper_byte(last.red))) << 8;
        } else {
            current.red |= last.red & 0xFF00;
        }

        if color_diff.colors_are_correlated() {
            let mut diff = i32::from(lower_byte(current.red)) - i32::from(lower_byte(last.red));

            if color_diff.lower_green_byte_changed() {
                let corr = decoder.decode_symbol(&mut models.lower_green_byte)? as u8;
                current.green = u16::from(
                    corr.wrapping_add(u8_clamp(diff + i32::from(lower_byte(last.green)))),
                );
            } else {
                current.green = last.green & 0x00FF;
            }

            if color_diff.lower_blue_byte_changed() {
                let corr = decoder.decode_symbol(&mut models.lower_blue_byte)? as u8;
                diff = (diff + i32::from(lower_byte(current.green))
                    - i32::from(lower_byte(last.green)))
                    / 2;
                current.blue = u16::from(
                    corr.wrapping_add(u8_clamp(diff + i32::from(lower_byte(last.blue)))),
                );
            } else {
                current.blue = last.blue & 0x00FF;
            }

            diff = i32::from(upper_byte(current.red)) - i32::from(upper_byte(last.red));

            if color_diff.upper_green_byte_changed() {
                let corr = decoder.decode_symbol(&mut models.upper_green_byte)? as u8;
                current.green |= u16::from(
                    corr.wrapping_add(u8_clamp(diff + i32::from(upper_byte(last.green)))),
                ) << 8;
            } else {
                current.green |= last.green & 0xFF00;
            }

            if color_diff.upper_blue_byte_changed() {
                let corr = decoder.decode_symbol(&mut models.upper_blue_byte)? as u8;
                diff = (diff + i32::from(upper_byte(current.green))
                    - i32::from(upper_byte(last.green)))
                    / 2;
                current.blue |= u16::from(
                    corr.wrapping_add(u8_clamp(diff + i32::from(upper_byte(last.blue)))),
                ) << 8;
            } else {
                current.blue |= last.blue & 0xFF00;
            }
        } else {
            current.green = current.red;
            current.blue = current.red;
        }
        Ok(current)
    }

    pub struct RgbCompressor {
        last: Rgb,
        models: RgbModels,
    }

    impl RgbCompressor {
        pub fn new() -> Self {
            Self {
                last: Rgb::default(),
                models: RgbModels::default(),
            }
        }
    }

    impl<W: Write> FieldCompressor<W> for RgbCompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn compress_first(&mut self, dst: &mut W, buf: &[u8]) -> std::io::Result<()> {
            self.last = Rgb::unpack_from(buf);
            dst.write_all(buf)
        }

        fn compress_with(
            &mut self,
            encoder: &mut RangeEncoder<W>,
            buf: &[u8],
        ) -> std::io::Result<()> {
            let current = Rgb::unpack_from(buf);
            compress_rgb_using(encoder, &mut self.models, &current, &self.last)?;
            self.last = current;
            Ok(())
        }
    }

    pub struct RgbDecompressor {
        last: Rgb,
        models: RgbModels,
    }

    impl RgbDecompressor {
        pub fn new() -> Self {
            Self {
                last: Rgb::default(),
                models: RgbModels::default(),
            }
        }
    }

    impl<R: Read> FieldDecompressor<R> for RgbDecompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn decompress_first(&mut self, src: &mut R, first_point: &mut [u8]) -> std::io::Result<()> {
            self.last = read_and_unpack::<_, Rgb>(src, first_point)?;
            Ok(())
        }

        fn decompress_with(
            &mut self,
            decoder: &mut RangeDecoder<R>,
            buf: &mut [u8],
        ) -> std::io::Result<()> {
            let current = decompress_rgb_using(decoder, &mut self.models, &self.last)?;
            self.last = current;
            current.pack_into(buf);
            Ok(())
        }
    }
}

pub mod v3 {
    //! Same modeling as version 2, wrapped in the scanner channel
    //! context machinery and buffered in its own layer.
    use std::io::{Cursor, Read, Seek, Write};

    use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

    use crate::entropy::{RangeDecoder, RangeEncoder};
    use crate::layers::{copy_bytes_into_decoder, copy_encoder_content_to, inner_buffer_len_of};
    use crate::layout::DecompressionSelector;
    use crate::packing::{read_and_unpack, Packable};
    use crate::record::{LayeredFieldCompressor, LayeredFieldDecompressor};

    use super::v2;
    use super::Rgb;

    pub struct RgbDecompressor {
        decoder: RangeDecoder<Cursor<Vec<u8>>>,
        changed_rgb: bool,
        requested_rgb: bool,
        layer_size: u32,
        // one model set per scanner channel, created lazily
        contexts: [Option<v2::RgbModels>; 4],
        last_rgbs: [Rgb; 4],
        last_context_used: usize,
    }

    impl RgbDecompressor {
        pub fn new() -> Self {
            Self::selective(DecompressionSelector::all())
        }

        pub fn selective(selector: DecompressionSelector) -> Self {
            Self {
                decoder: RangeDecoder::new(Cursor::new(Vec::<u8>::new())),
                changed_rgb: false,
                requested_rgb: selector.rgb_requested(),
                layer_size: 0,
                contexts: [None, None, None, None],
                last_rgbs: [Rgb::default(); 4],
                last_context_used: 0,
            }
        }
    }

    impl<R: Read + Seek> LayeredFieldDecompressor<R> for RgbDecompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn init_first_point(
            &mut self,
            src: &mut R,
            first_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            for rgb_context in &mut self.contexts {
                *rgb_context = None;
            }
            self.last_rgbs[*context] = read_and_unpack::<_, Rgb>(src, first_point)?;
            self.contexts[*context] = Some(v2::RgbModels::default());
            self.last_context_used = *context;
            Ok(())
        }

        fn decompress_field_with(
            &mut self,
            current_point: &mut [u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            if self.last_context_used != *context {
                if self.contexts[*context].is_none() {
                    // seed the new channel from the one we come from
                    self.last_rgbs[*context] = self.last_rgbs[self.last_context_used];
                    self.contexts[*context] = Some(v2::RgbModels::default());
                }
                self.last_context_used = *context;
            }

            let last = &mut self.last_rgbs[self.last_context_used];
            if self.changed_rgb {
                let models = self.contexts[self.last_context_used]
                    .as_mut()
                    .expect("rgb context not initialized");
                let new = v2::decompress_rgb_using(&mut self.decoder, models, last)?;
                new.pack_into(current_point);
                *last = new;
            } else {
                last.pack_into(current_point);
            }
            Ok(())
        }

        fn read_layers_sizes(&mut self, src: &mut R) -> std::io::Result<()> {
            self.layer_size = src.read_u32::<LittleEndian>()?;
            Ok(())
        }

        fn read_layers(&mut self, src: &mut R) -> std::io::Result<()> {
            self.changed_rgb = copy_bytes_into_decoder(
                self.requested_rgb,
                self.layer_size as usize,
                &mut self.decoder,
                src,
            )?;
            Ok(())
        }
    }

    pub struct RgbCompressor {
        encoder: RangeEncoder<Cursor<Vec<u8>>>,
        rgb_has_changed: bool,
        contexts: [Option<v2::RgbModels>; 4],
        last_rgbs: [Option<Rgb>; 4],
        last_context_used: usize,
    }

    impl RgbCompressor {
        pub fn new() -> Self {
            Self {
                encoder: RangeEncoder::new(Cursor::new(Vec::<u8>::new())),
                rgb_has_changed: false,
                contexts: [None, None, None, None],
                last_rgbs: [None; 4],
                last_context_used: 0,
            }
        }
    }

    impl<W: Write> LayeredFieldCompressor<W> for RgbCompressor {
        fn size_of_field(&self) -> usize {
            Rgb::SIZE
        }

        fn init_first_point(
            &mut self,
            dst: &mut W,
            first_point: &[u8],
            context: &mut usize,
        ) -> std::io::Result<()> {
            dst.write_all(first_point)?;
            self.contexts[*context] = Some(v2::RgbModels::default());
            self.last_rgbs[*context] = Some(Rgb::unpack_from(first_point));
            self.last_context_used = *context;
            Ok(())
        }

        fn compress_field_with(&mut self, buf: &[u8], context: &mut usize) -> std::io::Result<()> {
            let current = Rgb::unpack_from(buf);

            if self.last_context_used != *context {
                if self.contexts[*context].is_none() {
                    self.contexts[*context] = Some(v2::RgbModels::default());
                    self.last_rgbs[*context] = self.last_rgbs[self.last_context_used];
                }
                self.last_context_used = *context;
            }

            let last = self.last_rgbs[self.last_context_used]
                .as_mut()
                .expect("rgb last value not initialized");
            if *last != current {
                self.rgb_has_changed = true;
            }
            let models = self.contexts[self.last_context_used]
                .as_mut()
                .expect("rgb context not initialized");
            v2::compress_rgb_using(&mut self.encoder, models, &current, last)?;
            *last = current;
            Ok(())
        }

        fn write_layers_sizes(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.rgb_has_changed {
                self.encoder.done()?;
                dst.write_u32::<LittleEndian>(inner_buffer_len_of(&self.encoder) as u32)?;
            } else {
                dst.write_u32::<LittleEndian>(0)?;
            }
            Ok(())
        }

        fn write_layers(&mut self, dst: &mut W) -> std::io::Result<()> {
            if self.rgb_has_changed {
                copy_encoder_content_to(&mut self.encoder, dst)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_bits() {
        let black = Rgb::default();
        let reddish = Rgb {
            red: 1,
            green: 0,
            blue: 0,
        };
        assert_eq!(ColorDiff::from_points(&reddish, &black).0, 0b0100_0001);
        assert_eq!(ColorDiff::from_points(&black, &reddish).0, 0b0000_0001);

        let bright = Rgb {
            red: 256,
            green: 256,
            blue: 256,
        };
        assert_eq!(ColorDiff::from_points(&bright, &black).0, 0b0010_1010);
    }

    #[test]
    fn no_change_no_bits() {
        let a = Rgb {
            red: 700,
            green: 700,
            blue: 700,
        };
        assert_eq!(ColorDiff::from_points(&a, &a).0, 0);
    }
}
