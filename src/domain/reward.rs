//! Pluggable reward computation rule.
//!
//! The production formula is tuned outside this crate; the engine only
//! relies on the computation contract: a pure, deterministic function of
//! swap volume (and optionally the token pair) that is monotone in
//! volume and awards zero for zero volume.

use ethers::types::U256;

/// Deterministic JXP award function.
///
/// Implementations must be pure: the same inputs always produce the same
/// award, larger volume never yields a smaller award, and zero volume
/// yields zero award. The calculator relies on this to make reprocessing
/// idempotent.
pub trait RewardRule: Send + Sync + std::fmt::Debug {
    /// Computes the JXP award for a swap.
    ///
    /// `volume` is the raw reference-token amount; `token_in` and
    /// `token_out` allow token-aware rules (e.g. boosted pairs).
    fn award(&self, volume: U256, token_in: &str, token_out: &str) -> u64;
}

/// Default volume-proportional rule:
/// `award = floor(volume · points_per_unit / 10^decimals)`.
///
/// All arithmetic is integer-only on `U256`; no floating point touches
/// the amounts. Awards larger than `u64::MAX` saturate.
#[derive(Debug, Clone)]
pub struct VolumeReward {
    /// Points awarded per whole reference-token unit.
    pub points_per_unit: u64,
    /// Decimals of the reference token.
    pub decimals: u32,
}

impl VolumeReward {
    /// Creates a rule awarding `points_per_unit` JXP per `10^decimals`
    /// raw units of volume.
    #[must_use]
    pub const fn new(points_per_unit: u64, decimals: u32) -> Self {
        Self {
            points_per_unit,
            decimals,
        }
    }
}

impl RewardRule for VolumeReward {
    fn award(&self, volume: U256, _token_in: &str, _token_out: &str) -> u64 {
        let scale = U256::exp10(self.decimals as usize);
        let scaled = volume.saturating_mul(U256::from(self.points_per_unit)) / scale;
        if scaled > U256::from(u64::MAX) {
            u64::MAX
        } else {
            scaled.as_u64()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn one_token_at_18_decimals_awards_ten() {
        let rule = VolumeReward::new(10, 18);
        let volume = U256::from_dec_str("1000000000000000000").unwrap();
        assert_eq!(rule.award(volume, "0xa", "0xb"), 10);
    }

    #[test]
    fn zero_volume_awards_zero() {
        let rule = VolumeReward::new(10, 18);
        assert_eq!(rule.award(U256::zero(), "0xa", "0xb"), 0);
    }

    #[test]
    fn fractional_volume_floors() {
        let rule = VolumeReward::new(10, 18);
        // 0.19 tokens -> floor(1.9) = 1 JXP
        let volume = U256::from_dec_str("190000000000000000").unwrap();
        assert_eq!(rule.award(volume, "0xa", "0xb"), 1);
    }

    #[test]
    fn award_is_monotone_in_volume() {
        let rule = VolumeReward::new(10, 18);
        let mut previous = 0u64;
        for units in [0u64, 1, 2, 5, 100, 10_000] {
            let volume = U256::from(units) * U256::exp10(18);
            let award = rule.award(volume, "0xa", "0xb");
            assert!(award >= previous);
            previous = award;
        }
    }

    #[test]
    fn oversized_award_saturates() {
        let rule = VolumeReward::new(u64::MAX, 0);
        assert_eq!(rule.award(U256::MAX, "0xa", "0xb"), u64::MAX);
    }
}
