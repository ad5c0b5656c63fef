use core::num::NonZeroU8;
use core::num::NonZeroU16;

/// Bit timing during the arbitration and data phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NominalBitTiming {
    /// Prescaler for the kernel clock. The bit time is built from multiples
    /// of this quantum. Valid range: 1 to 1024.
    pub prescaler: NonZeroU16,
    /// Time segment 1 (includes propagation and phase segments).
    /// Valid range: 1 to 16.
    pub seg1: NonZeroU8,
    /// Time segment 2 (phase segment 2).
    /// Valid range: 1 to 8.
    pub seg2: NonZeroU8,
    /// Synchronization jump width for clock tolerance.
    /// Valid range: 1 to 4.
    pub sync_jump_width: NonZeroU8,
}

impl Default for NominalBitTiming {
    #[inline]
    fn default() -> Self {
        BitRate::Kbit500.timing()
    }
}

/// Supported CAN bit rates
///
/// The discriminant is the rate in kbit/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u16)]
pub enum BitRate {
    Kbit10 = 10,
    Kbit20 = 20,
    Kbit50 = 50,
    Kbit100 = 100,
    Kbit125 = 125,
    Kbit250 = 250,
    Kbit500 = 500,
    Kbit1000 = 1000,
}

impl BitRate {
    pub const fn from_kbit(value: u16) -> Option<Self> {
        match value {
            10 => Some(BitRate::Kbit10),
            20 => Some(BitRate::Kbit20),
            50 => Some(BitRate::Kbit50),
            100 => Some(BitRate::Kbit100),
            125 => Some(BitRate::Kbit125),
            250 => Some(BitRate::Kbit250),
            500 => Some(BitRate::Kbit500),
            1000 => Some(BitRate::Kbit1000),
            _ => None,
        }
    }

    pub const fn into_kbit(self) -> u16 {
        self as u16
    }

    /// Bit timing for this rate, assuming an 80 MHz kernel clock.
    ///
    /// All rates use 16 time quanta per bit with seg1 = 13 and seg2 = 2,
    /// placing the sample point at 87.5 %; only the prescaler varies.
    /// Values from <http://bittiming.can-wiki.info>.
    pub const fn timing(self) -> NominalBitTiming {
        let prescaler = match self {
            BitRate::Kbit10 => 500,
            BitRate::Kbit20 => 250,
            BitRate::Kbit50 => 100,
            BitRate::Kbit100 => 50,
            BitRate::Kbit125 => 40,
            BitRate::Kbit250 => 20,
            BitRate::Kbit500 => 10,
            BitRate::Kbit1000 => 5,
        };

        NominalBitTiming {
            prescaler: NonZeroU16::new(prescaler).unwrap(),
            seg1: NonZeroU8::new(13).unwrap(),
            seg2: NonZeroU8::new(2).unwrap(),
            sync_jump_width: NonZeroU8::new(1).unwrap(),
        }
    }
}

impl From<BitRate> for u16 {
    fn from(value: BitRate) -> Self {
        value.into_kbit()
    }
}
