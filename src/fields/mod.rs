//! Field codecs, one module per record attribute.
//!
//! Each attribute module holds the codec versions that exist for it,
//! the `v1`/`v2`/`v3` modules below regroup them by version.

pub mod color;
pub mod core;
pub mod extended;
pub mod extra;
pub mod gpstime;
pub mod nir;
pub mod wavepacket;

pub use self::color::Rgb;
pub use self::core::CorePoint;
pub use self::extended::ExtendedPoint;
pub use self::gpstime::GpsTime;
pub use self::wavepacket::WavePacket;

pub mod v1 {
    pub use super::color::v1::{RgbCompressor, RgbDecompressor};
    pub use super::core::v1::{CoreCompressor, CoreDecompressor};
    pub use super::extra::v1::{ExtraBytesCompressor, ExtraBytesDecompressor};
    pub use super::gpstime::v1::{GpsTimeCompressor, GpsTimeDecompressor};
    pub use super::wavepacket::v1::{WavePacketCompressor, WavePacketDecompressor};
}

pub mod v2 {
    pub use super::color::v2::{RgbCompressor, RgbDecompressor};
    pub use super::core::v2::{CoreCompressor, CoreDecompressor};
    // the extra bytes codec never changed between the two pointwise
    // versions
    pub use super::extra::v1::{ExtraBytesCompressor, ExtraBytesDecompressor};
    pub use super::gpstime::v2::{GpsTimeCompressor, GpsTimeDecompressor};
}

pub mod v3 {
    pub use super::color::v3::{RgbCompressor, RgbDecompressor};
    pub use super::extended::v3::{ExtendedCompressor, ExtendedDecompressor};
    pub use super::extra::v3::{ExtraBytesCompressor, ExtraBytesDecompressor};
    pub use super::nir::v3::{NirCompressor, NirDecompressor};
    pub use super::wavepacket::v3::{WavePacketCompressor, WavePacketDecompressor};
}
