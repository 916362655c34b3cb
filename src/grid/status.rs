//! Two-bit peak status stored per grid cell.

/// Peak status bits of one cell.
///
/// The peak finder marks each raw candidate with both bits. Noise
/// suppression then rewrites candidates as `CANDIDATE | PEAK` when they
/// survive and as `CANDIDATE` alone when they are suppressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PeakStatus(u8);

impl PeakStatus {
    /// Confirmed peak, or a raw candidate not yet suppressed.
    pub const PEAK: u8 = 0b01;
    /// Cell was a raw candidate of the peak finder.
    pub const CANDIDATE: u8 = 0b10;

    /// Cell never flagged.
    pub const UNSET: Self = Self(0);
    /// Raw candidate written by the peak finder.
    pub const RAW_CANDIDATE: Self = Self(Self::CANDIDATE | Self::PEAK);

    /// Wraps raw bits, dropping anything above the two status bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & (Self::CANDIDATE | Self::PEAK))
    }

    /// Final status of a candidate after suppression.
    pub const fn resolved(keep: bool) -> Self {
        Self(Self::CANDIDATE | keep as u8)
    }

    /// Returns the raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether the peak bit is set.
    #[inline]
    pub const fn is_peak(self) -> bool {
        self.0 & Self::PEAK != 0
    }

    /// Whether the cell was ever a raw candidate.
    #[inline]
    pub const fn was_candidate(self) -> bool {
        self.0 & Self::CANDIDATE != 0
    }
}
