//! Fixed-point charge encoding used by the charge map.

/// Charge packed into 16 bits: 14-bit fixed point with 4 fractional bits,
/// plus two flag bits carried by the charge map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PackedCharge(u16);

impl PackedCharge {
    const CHARGE_BITS: u32 = 14;
    const DECIMAL_BITS: u32 = 4;
    const CHARGE_MASK: u16 = (1 << Self::CHARGE_BITS) - 1;
    const HAS_3X3_PEAK: u16 = 1 << 14;
    const IS_SPLIT: u16 = 1 << 15;

    /// Largest charge representable without saturation.
    pub const MAX_CHARGE: f32 =
        Self::CHARGE_MASK as f32 / (1u32 << Self::DECIMAL_BITS) as f32;

    /// Packs a charge, saturating at [`Self::MAX_CHARGE`].
    ///
    /// Negative and NaN input pack to zero.
    pub fn pack(charge: f32) -> Self {
        Self::with_flags(charge, false, false)
    }

    /// Packs a charge together with the map flags.
    pub fn with_flags(charge: f32, has_3x3_peak: bool, is_split: bool) -> Self {
        let scaled = (charge * (1u32 << Self::DECIMAL_BITS) as f32).round();
        // `as` saturates on overflow and maps NaN to zero.
        let raw = (scaled.max(0.0) as u32).min(Self::CHARGE_MASK as u32) as u16;
        let mut bits = raw;
        if has_3x3_peak {
            bits |= Self::HAS_3X3_PEAK;
        }
        if is_split {
            bits |= Self::IS_SPLIT;
        }
        Self(bits)
    }

    /// Wraps raw bits as stored in a charge map buffer.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Recovers the charge within quantization error (1/16).
    #[inline]
    pub fn unpack(self) -> f32 {
        (self.0 & Self::CHARGE_MASK) as f32 / (1u32 << Self::DECIMAL_BITS) as f32
    }

    /// Whether the peak finder saw a 3x3 peak at this cell.
    pub fn has_3x3_peak(self) -> bool {
        self.0 & Self::HAS_3X3_PEAK != 0
    }

    /// Whether this charge was split between clusters.
    pub fn is_split(self) -> bool {
        self.0 & Self::IS_SPLIT != 0
    }
}
