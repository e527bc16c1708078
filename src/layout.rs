//! Declarative description of a point record: which fields it carries,
//! their sizes, and which codec version handles each of them.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::Error;

/// The kinds of fields a record can be composed of.
///
/// The `Extended` variants belong to the scanner-channel-aware record
/// generation and are always coded with the layered (version 3) codecs;
/// the others are pointwise (versions 1 and 2).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Base geometry, returns and flags (20 bytes).
    Core,
    /// GPS time as a double (8 bytes).
    GpsTime,
    /// Red, green, blue (3 x 2 bytes).
    Rgb,
    /// Wave packet descriptor (29 bytes).
    WavePacket,
    /// Opaque trailing bytes.
    ExtraBytes(u16),
    /// Extended geometry, returns, channel, GPS time (30 bytes).
    Extended,
    ExtendedRgb,
    /// RGB plus near infrared (8 bytes).
    ExtendedRgbNir,
    ExtendedWavePacket,
    ExtendedExtraBytes(u16),
}

impl FieldKind {
    pub fn size(&self) -> u16 {
        match *self {
            FieldKind::Core => 20,
            FieldKind::GpsTime => 8,
            FieldKind::Rgb => 6,
            FieldKind::WavePacket => 29,
            FieldKind::ExtraBytes(count) => count,
            FieldKind::Extended => 30,
            FieldKind::ExtendedRgb => 6,
            FieldKind::ExtendedRgbNir => 8,
            FieldKind::ExtendedWavePacket => 29,
            FieldKind::ExtendedExtraBytes(count) => count,
        }
    }

    /// Stream id of the field, compatible with the original format.
    pub fn wire_id(&self) -> u16 {
        match *self {
            FieldKind::ExtraBytes(_) => 0,
            FieldKind::Core => 6,
            FieldKind::GpsTime => 7,
            FieldKind::Rgb => 8,
            FieldKind::WavePacket => 9,
            FieldKind::Extended => 10,
            FieldKind::ExtendedRgb => 11,
            FieldKind::ExtendedRgbNir => 12,
            FieldKind::ExtendedWavePacket => 13,
            FieldKind::ExtendedExtraBytes(_) => 14,
        }
    }

    /// Default codec version for this field.
    pub fn default_version(&self) -> u16 {
        match *self {
            FieldKind::Core
            | FieldKind::GpsTime
            | FieldKind::Rgb
            | FieldKind::ExtraBytes(_) => 2,
            FieldKind::WavePacket => 1,
            _ => 3,
        }
    }

    fn from_wire(id: u16, size: u16) -> crate::Result<Self> {
        match id {
            0 => Ok(FieldKind::ExtraBytes(size)),
            6 => Ok(FieldKind::Core),
            7 => Ok(FieldKind::GpsTime),
            8 => Ok(FieldKind::Rgb),
            9 => Ok(FieldKind::WavePacket),
            10 => Ok(FieldKind::Extended),
            11 => Ok(FieldKind::ExtendedRgb),
            12 => Ok(FieldKind::ExtendedRgbNir),
            13 => Ok(FieldKind::ExtendedWavePacket),
            14 => Ok(FieldKind::ExtendedExtraBytes(size)),
            _ => Err(Error::UnknownFieldId(id)),
        }
    }
}

/// One field of a record layout: its kind, byte size and codec version.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    kind: FieldKind,
    size: u16,
    version: u16,
}

impl FieldDescriptor {
    pub fn new(kind: FieldKind, version: u16) -> Self {
        Self {
            kind,
            size: kind.size(),
            version,
        }
    }

    pub fn with_default_version(kind: FieldKind) -> Self {
        Self::new(kind, kind.default_version())
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    pub fn read_from<R: Read>(src: &mut R) -> crate::Result<Self> {
        let id = src.read_u16::<LittleEndian>()?;
        let size = src.read_u16::<LittleEndian>()?;
        let version = src.read_u16::<LittleEndian>()?;
        Ok(Self {
            kind: FieldKind::from_wire(id, size)?,
            size,
            version,
        })
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u16::<LittleEndian>(self.kind.wire_id())?;
        dst.write_u16::<LittleEndian>(self.size)?;
        dst.write_u16::<LittleEndian>(self.version)?;
        Ok(())
    }
}

/// Ordered list of the fields making up one point record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordLayout {
    fields: Vec<FieldDescriptor>,
}

impl RecordLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::with_default_version(kind));
        self
    }

    pub fn with_field_version(mut self, kind: FieldKind, version: u16) -> Self {
        self.fields.push(FieldDescriptor::new(kind, version));
        self
    }

    /// Layout of a standard point format, `extra_bytes` trailing bytes
    /// appended when non zero.
    pub fn for_point_format(point_format_id: u8, extra_bytes: u16) -> crate::Result<Self> {
        let mut layout = Self::new();
        match point_format_id {
            0 => layout = layout.with_field(FieldKind::Core),
            1 => layout = layout.with_field(FieldKind::Core).with_field(FieldKind::GpsTime),
            2 => layout = layout.with_field(FieldKind::Core).with_field(FieldKind::Rgb),
            3 => {
                layout = layout
                    .with_field(FieldKind::Core)
                    .with_field(FieldKind::GpsTime)
                    .with_field(FieldKind::Rgb)
            }
            4 => {
                layout = layout
                    .with_field(FieldKind::Core)
                    .with_field(FieldKind::GpsTime)
                    .with_field(FieldKind::WavePacket)
            }
            5 => {
                layout = layout
                    .with_field(FieldKind::Core)
                    .with_field(FieldKind::GpsTime)
                    .with_field(FieldKind::Rgb)
                    .with_field(FieldKind::WavePacket)
            }
            6 => layout = layout.with_field(FieldKind::Extended),
            7 => {
                layout = layout
                    .with_field(FieldKind::Extended)
                    .with_field(FieldKind::ExtendedRgb)
            }
            8 => {
                layout = layout
                    .with_field(FieldKind::Extended)
                    .with_field(FieldKind::ExtendedRgbNir)
            }
            9 => {
                layout = layout
                    .with_field(FieldKind::Extended)
                    .with_field(FieldKind::ExtendedWavePacket)
            }
            10 => {
                layout = layout
                    .with_field(FieldKind::Extended)
                    .with_field(FieldKind::ExtendedRgbNir)
                    .with_field(FieldKind::ExtendedWavePacket)
            }
            _ => return Err(Error::UnsupportedPointFormat(point_format_id)),
        };
        if extra_bytes > 0 {
            let kind = if point_format_id >= 6 {
                FieldKind::ExtendedExtraBytes(extra_bytes)
            } else {
                FieldKind::ExtraBytes(extra_bytes)
            };
            layout = layout.with_field(kind);
        }
        Ok(layout)
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Size in bytes of one uncompressed record.
    pub fn record_size(&self) -> usize {
        self.fields.iter().map(|f| usize::from(f.size)).sum()
    }

    /// True when the layout uses the layered (version 3) codecs.
    pub fn is_layered(&self) -> bool {
        self.fields.first().map_or(false, |f| f.version >= 3)
    }

    pub fn read_from<R: Read>(src: &mut R) -> crate::Result<Self> {
        let count = src.read_u16::<LittleEndian>()?;
        let mut fields = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            fields.push(FieldDescriptor::read_from(src)?);
        }
        Ok(Self { fields })
    }

    pub fn write_to<W: Write>(&self, dst: &mut W) -> std::io::Result<()> {
        dst.write_u16::<LittleEndian>(self.fields.len() as u16)?;
        for field in &self.fields {
            field.write_to(dst)?;
        }
        Ok(())
    }
}

macro_rules! selector_methods {
    ($(($request:ident, $skip:ident, $queried:ident, $mask:expr)),+ $(,)?) => {
        $(
            pub fn $request(self) -> Self {
                Self(self.0 | $mask)
            }

            pub fn $skip(self) -> Self {
                Self(self.0 & !$mask)
            }

            pub fn $queried(self) -> bool {
                (self.0 & $mask) != 0
            }
        )+
    };
}

/// Which attribute groups a layered decompressor should materialize.
///
/// Layers excluded here are seeked over without decoding. Only the
/// layered (extended) formats honor the selection; pointwise codecs
/// always decode everything. The x/y/returns/channel layer can never be
/// skipped since every other layer's contexts depend on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecompressionSelector(pub u32);

impl DecompressionSelector {
    pub const Z: u32 = 1 << 0;
    pub const CLASSIFICATION: u32 = 1 << 1;
    pub const FLAGS: u32 = 1 << 2;
    pub const INTENSITY: u32 = 1 << 3;
    pub const SCAN_ANGLE: u32 = 1 << 4;
    pub const USER_DATA: u32 = 1 << 5;
    pub const POINT_SOURCE: u32 = 1 << 6;
    pub const GPS_TIME: u32 = 1 << 7;
    pub const RGB: u32 = 1 << 8;
    pub const NIR: u32 = 1 << 9;
    pub const WAVE_PACKET: u32 = 1 << 10;
    pub const EXTRA_BYTES: u32 = 1 << 11;

    /// Decompress every layer.
    pub fn all() -> Self {
        Self(u32::max_value())
    }

    /// Only x, y, return info and scanner channel.
    pub fn base() -> Self {
        Self(0)
    }

    selector_methods!(
        (request_z, skip_z, z_requested, Self::Z),
        (
            request_classification,
            skip_classification,
            classification_requested,
            Self::CLASSIFICATION
        ),
        (request_flags, skip_flags, flags_requested, Self::FLAGS),
        (
            request_intensity,
            skip_intensity,
            intensity_requested,
            Self::INTENSITY
        ),
        (
            request_scan_angle,
            skip_scan_angle,
            scan_angle_requested,
            Self::SCAN_ANGLE
        ),
        (
            request_user_data,
            skip_user_data,
            user_data_requested,
            Self::USER_DATA
        ),
        (
            request_point_source,
            skip_point_source,
            point_source_requested,
            Self::POINT_SOURCE
        ),
        (
            request_gps_time,
            skip_gps_time,
            gps_time_requested,
            Self::GPS_TIME
        ),
        (request_rgb, skip_rgb, rgb_requested, Self::RGB),
        (request_nir, skip_nir, nir_requested, Self::NIR),
        (
            request_wave_packet,
            skip_wave_packet,
            wave_packet_requested,
            Self::WAVE_PACKET
        ),
        (
            request_extra_bytes,
            skip_extra_bytes,
            extra_bytes_requested,
            Self::EXTRA_BYTES
        ),
    );
}

impl Default for DecompressionSelector {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn format_sizes() {
        assert_eq!(
            RecordLayout::for_point_format(0, 0).unwrap().record_size(),
            20
        );
        assert_eq!(
            RecordLayout::for_point_format(1, 0).unwrap().record_size(),
            28
        );
        assert_eq!(
            RecordLayout::for_point_format(3, 7).unwrap().record_size(),
            41
        );
        assert_eq!(
            RecordLayout::for_point_format(6, 0).unwrap().record_size(),
            30
        );
        assert_eq!(
            RecordLayout::for_point_format(8, 0).unwrap().record_size(),
            38
        );
        assert_eq!(
            RecordLayout::for_point_format(10, 2).unwrap().record_size(),
            69
        );
        assert!(RecordLayout::for_point_format(11, 0).is_err());
    }

    #[test]
    fn layered_detection() {
        assert!(!RecordLayout::for_point_format(3, 0).unwrap().is_layered());
        assert!(RecordLayout::for_point_format(7, 0).unwrap().is_layered());
    }

    #[test]
    fn descriptors_roundtrip_through_bytes() {
        let layout = RecordLayout::for_point_format(8, 5).unwrap();
        let mut buf = Cursor::new(Vec::new());
        layout.write_to(&mut buf).unwrap();
        buf.set_position(0);
        assert_eq!(RecordLayout::read_from(&mut buf).unwrap(), layout);
    }

    #[test]
    fn selector_bits() {
        let selector = DecompressionSelector::base().request_rgb().request_z();
        assert!(selector.rgb_requested());
        assert!(selector.z_requested());
        assert!(!selector.gps_time_requested());
        assert!(!DecompressionSelector::all().skip_nir().nir_requested());
    }
}
