//! Helpers for the layered codecs, which buffer each attribute group in
//! its own in-memory substream before it is spliced into the output.

use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use crate::entropy::{RangeDecoder, RangeEncoder};

/// Loads one layer's bytes into `decoder`'s inner buffer, or seeks past
/// them when the layer was not requested.
///
/// Returns true when the layer was materialized and the decoder primed.
pub(crate) fn copy_bytes_into_decoder<R: Read + Seek>(
    is_requested: bool,
    num_bytes: usize,
    decoder: &mut RangeDecoder<Cursor<Vec<u8>>>,
    src: &mut R,
) -> std::io::Result<bool> {
    let inner_vec = decoder.get_mut().get_mut();
    if is_requested {
        if num_bytes > 0 {
            inner_vec.resize(num_bytes, 0);
            src.read_exact(&mut inner_vec[..num_bytes])?;
            decoder.get_mut().set_position(0);
            decoder.read_init_bytes()?;
            Ok(true)
        } else {
            inner_vec.resize(0, 0);
            Ok(false)
        }
    } else {
        if num_bytes > 0 {
            src.seek(SeekFrom::Current(num_bytes as i64))?;
        }
        Ok(false)
    }
}

pub(crate) fn inner_buffer_len_of(encoder: &RangeEncoder<Cursor<Vec<u8>>>) -> usize {
    encoder.get_ref().get_ref().len()
}

#[inline]
pub(crate) fn copy_encoder_content_to<W: Write>(
    encoder: &mut RangeEncoder<Cursor<Vec<u8>>>,
    dst: &mut W,
) -> std::io::Result<()> {
    dst.write_all(encoder.get_mut().get_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrequested_layer_is_seeked_over() {
        let mut src = Cursor::new(vec![1u8, 2, 3, 4, 5, 6]);
        let mut decoder = RangeDecoder::new(Cursor::new(Vec::new()));
        let loaded = copy_bytes_into_decoder(false, 4, &mut decoder, &mut src).unwrap();
        assert!(!loaded);
        assert_eq!(src.position(), 4);
    }

    #[test]
    fn requested_layer_fills_decoder_buffer() {
        let mut encoder = RangeEncoder::new(Cursor::new(Vec::new()));
        encoder.write_int(0xDEADBEEF).unwrap();
        encoder.done().unwrap();
        let bytes = encoder.get_ref().get_ref().clone();

        let mut src = Cursor::new(bytes.clone());
        let mut decoder = RangeDecoder::new(Cursor::new(Vec::new()));
        let loaded = copy_bytes_into_decoder(true, bytes.len(), &mut decoder, &mut src).unwrap();
        assert!(loaded);
        assert_eq!(decoder.read_int().unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn empty_layer_clears_previous_content() {
        let mut src = Cursor::new(Vec::new());
        let mut decoder = RangeDecoder::new(Cursor::new(vec![9u8; 16]));
        let loaded = copy_bytes_into_decoder(true, 0, &mut decoder, &mut src).unwrap();
        assert!(!loaded);
        assert!(decoder.get_mut().get_ref().is_empty());
    }
}
