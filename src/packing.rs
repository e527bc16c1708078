//! Little-endian packing of record fields to and from byte slices.
//!
//! Record buffers are laid out exactly as they would be on disk, so every
//! field type knows how to read and write itself at the start of a slice.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian};

pub trait Packable {
    fn unpack_from(input: &[u8]) -> Self;
    fn pack_into(&self, output: &mut [u8]);
}

impl Packable for u8 {
    fn unpack_from(input: &[u8]) -> Self {
        input[0]
    }

    fn pack_into(&self, output: &mut [u8]) {
        output[0] = *self;
    }
}

impl Packable for u16 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_u16(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_u16(output, *self)
    }
}

impl Packable for u32 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_u32(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_u32(output, *self)
    }
}

impl Packable for u64 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_u64(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_u64(output, *self)
    }
}

impl Packable for i8 {
    fn unpack_from(input: &[u8]) -> Self {
        input[0] as i8
    }

    fn pack_into(&self, output: &mut [u8]) {
        output[0] = *self as u8;
    }
}

impl Packable for i16 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_i16(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_i16(output, *self)
    }
}

impl Packable for i32 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_i32(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_i32(output, *self)
    }
}

impl Packable for f32 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_f32(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_f32(output, *self)
    }
}

impl Packable for f64 {
    fn unpack_from(input: &[u8]) -> Self {
        LittleEndian::read_f64(input)
    }

    fn pack_into(&self, output: &mut [u8]) {
        LittleEndian::write_f64(output, *self)
    }
}

#[inline(always)]
pub(crate) fn read_and_unpack<R: Read, P: Packable>(
    src: &mut R,
    buf: &mut [u8],
) -> std::io::Result<P> {
    src.read_exact(buf)?;
    Ok(P::unpack_from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_pack_unpack() {
        let mut buf = [0u8; 8];

        0xDEAD_BEEFu32.pack_into(&mut buf);
        assert_eq!(u32::unpack_from(&buf), 0xDEAD_BEEF);
        assert_eq!(&buf[..4], &[0xEF, 0xBE, 0xAD, 0xDE]);

        (-1234i16).pack_into(&mut buf);
        assert_eq!(i16::unpack_from(&buf), -1234);

        1.5f64.pack_into(&mut buf);
        assert_eq!(f64::unpack_from(&buf), 1.5);
    }
}
