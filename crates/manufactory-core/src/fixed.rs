use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Hours are the atomic unit of simulated time for arrivals.
pub type Hours = u32;

/// Convert an f64 to Fixed64. Use only for initialization, never in the tick loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Scale an integer money amount by a fixed-point factor, truncating toward
/// zero. Saturates instead of overflowing.
#[inline]
pub fn scale_money(amount: i64, factor: Fixed64) -> i64 {
    let wide = i128::from(amount) * i128::from(factor.to_bits());
    let scaled = wide >> 32;
    // Arithmetic shift floors; correct negative values back toward zero.
    let scaled = if wide < 0 && wide & 0xFFFF_FFFF != 0 {
        scaled + 1
    } else {
        scaled
    };
    scaled.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Serde adapter that reads and writes a [`Fixed64`] as a decimal number,
/// so data files can say `1.25` instead of raw fixed-point bits.
pub mod serde_f64 {
    use super::{Fixed64, fixed64_to_f64};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fixed64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(fixed64_to_f64(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fixed64, D::Error> {
        let v = f64::deserialize(deserializer)?;
        Fixed64::checked_from_num(v)
            .ok_or_else(|| serde::de::Error::custom(format!("{v} is out of fixed-point range")))
    }
}
