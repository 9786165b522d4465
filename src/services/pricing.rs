//! Buy-order pricing
//!
//! Fee math over exact decimals. Rounding is half-up and applied at every
//! intermediate step, not only on the final total, so two quotes for the
//! same inputs are always identical paise-for-paise.

use bigdecimal::{rounding::RoundingMode, BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::str::FromStr;

/// Round to 2 decimal places (currency), half-up
pub fn round2(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(2, RoundingMode::HalfUp)
}

/// Round to 4 decimal places (gold grams), half-up
pub fn round4(value: &BigDecimal) -> BigDecimal {
    value.with_scale_round(4, RoundingMode::HalfUp)
}

/// Fee rates read from the settings `fees` blob
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSchedule {
    pub spread_bps: i64,
    pub convenience_fee_bps: i64,
    pub gst_rate: BigDecimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            spread_bps: 0,
            convenience_fee_bps: 0,
            gst_rate: BigDecimal::from(3),
        }
    }
}

impl FeeSchedule {
    /// Read the schedule from the settings JSON blob, falling back to the
    /// platform defaults for absent or malformed fields.
    pub fn from_settings(fees: Option<&JsonValue>) -> Self {
        let defaults = Self::default();
        let Some(fees) = fees else {
            return defaults;
        };

        Self {
            spread_bps: fees
                .get("spreadBps")
                .and_then(|v| v.as_i64())
                .unwrap_or(defaults.spread_bps),
            convenience_fee_bps: fees
                .get("convenienceFeeBps")
                .and_then(|v| v.as_i64())
                .unwrap_or(defaults.convenience_fee_bps),
            gst_rate: fees
                .get("gstRate")
                .and_then(|v| BigDecimal::from_str(&v.to_string()).ok())
                .unwrap_or(defaults.gst_rate),
        }
    }
}

/// Full pricing breakdown for one buy order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub base_amount: BigDecimal,
    pub spread: BigDecimal,
    pub convenience_fee: BigDecimal,
    pub gst: BigDecimal,
    pub total_payable: BigDecimal,
}

impl PricingBreakdown {
    /// Metadata blob persisted on the transaction row
    pub fn metadata(&self, schedule: &FeeSchedule) -> JsonValue {
        serde_json::json!({
            "pricing": {
                "baseAmount": self.base_amount.to_string(),
                "spread": self.spread.to_string(),
                "convenienceFee": self.convenience_fee.to_string(),
                "gst": self.gst.to_string(),
                "totalPayable": self.total_payable.to_string(),
                "spreadBps": schedule.spread_bps,
                "convBps": schedule.convenience_fee_bps,
                "gstRate": schedule.gst_rate.to_string(),
            }
        })
    }
}

/// Compute the fee breakdown for a base amount.
///
/// spread and convenience fee are basis points of the base amount; GST
/// applies to the convenience fee only.
pub fn compute_pricing(amount: &BigDecimal, schedule: &FeeSchedule) -> PricingBreakdown {
    let bps_divisor = BigDecimal::from(10_000);
    let percent_divisor = BigDecimal::from(100);

    let spread = round2(&(amount * BigDecimal::from(schedule.spread_bps) / &bps_divisor));
    let convenience_fee =
        round2(&(amount * BigDecimal::from(schedule.convenience_fee_bps) / &bps_divisor));
    let gst = round2(&(&convenience_fee * &schedule.gst_rate / &percent_divisor));
    let total_payable = round2(&(amount + &spread + &convenience_fee + &gst));

    PricingBreakdown {
        base_amount: round2(amount),
        spread,
        convenience_fee,
        gst,
        total_payable,
    }
}

/// Gold grams purchased for an amount at a per-gram price, 4dp half-up
pub fn grams_for(amount: &BigDecimal, price_per_gram: &BigDecimal) -> BigDecimal {
    round4(&(amount / price_per_gram))
}

/// Convert a currency total to minor units (paise) for the payment provider
pub fn to_minor_units(total_payable: &BigDecimal) -> i64 {
    (total_payable * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("test decimal")
    }

    #[test]
    fn grams_round_to_four_decimals() {
        // 1000 / 6000 = 0.16666... -> 0.1667
        assert_eq!(grams_for(&dec("1000"), &dec("6000")), dec("0.1667"));
    }

    #[test]
    fn zero_fee_schedule_passes_amount_through() {
        let schedule = FeeSchedule {
            spread_bps: 0,
            convenience_fee_bps: 0,
            gst_rate: BigDecimal::from(3),
        };
        let pricing = compute_pricing(&dec("1000"), &schedule);
        assert_eq!(pricing.spread, dec("0.00"));
        assert_eq!(pricing.convenience_fee, dec("0.00"));
        assert_eq!(pricing.gst, dec("0.00"));
        assert_eq!(pricing.total_payable, dec("1000.00"));
    }

    #[test]
    fn fee_breakdown_matches_reference_scenario() {
        // 0.5% spread, 1% convenience, 3% GST on the convenience fee
        let schedule = FeeSchedule {
            spread_bps: 50,
            convenience_fee_bps: 100,
            gst_rate: BigDecimal::from(3),
        };
        let pricing = compute_pricing(&dec("1000"), &schedule);
        assert_eq!(pricing.spread, dec("5.00"));
        assert_eq!(pricing.convenience_fee, dec("10.00"));
        assert_eq!(pricing.gst, dec("0.30"));
        assert_eq!(pricing.total_payable, dec("1015.30"));
    }

    #[test]
    fn rounding_is_applied_at_each_step() {
        // 333 * 0.0015 = 0.4995 -> 0.50 at the spread step, not carried raw
        let schedule = FeeSchedule {
            spread_bps: 15,
            convenience_fee_bps: 0,
            gst_rate: BigDecimal::from(3),
        };
        let pricing = compute_pricing(&dec("333"), &schedule);
        assert_eq!(pricing.spread, dec("0.50"));
        assert_eq!(pricing.total_payable, dec("333.50"));
    }

    #[test]
    fn total_payable_is_never_below_base_amount() {
        let schedule = FeeSchedule {
            spread_bps: 50,
            convenience_fee_bps: 100,
            gst_rate: BigDecimal::from(3),
        };
        for amount in ["10", "999.99", "123456.78"] {
            let pricing = compute_pricing(&dec(amount), &schedule);
            assert!(pricing.total_payable >= pricing.base_amount);
        }
    }

    #[test]
    fn minor_units_round_half_up() {
        assert_eq!(to_minor_units(&dec("1015.30")), 101530);
        assert_eq!(to_minor_units(&dec("1000")), 100000);
        assert_eq!(to_minor_units(&dec("0.005")), 1);
    }

    #[test]
    fn fee_schedule_reads_settings_blob() {
        let blob = serde_json::json!({ "spreadBps": 50, "convenienceFeeBps": 100, "gstRate": 3 });
        let schedule = FeeSchedule::from_settings(Some(&blob));
        assert_eq!(schedule.spread_bps, 50);
        assert_eq!(schedule.convenience_fee_bps, 100);
        assert_eq!(schedule.gst_rate, BigDecimal::from(3));
    }

    #[test]
    fn fee_schedule_defaults_when_blob_missing() {
        let schedule = FeeSchedule::from_settings(None);
        assert_eq!(schedule.spread_bps, 0);
        assert_eq!(schedule.convenience_fee_bps, 0);
        assert_eq!(schedule.gst_rate, BigDecimal::from(3));
    }

    #[test]
    fn fractional_gst_rate_is_exact() {
        let blob = serde_json::json!({ "convenienceFeeBps": 100, "gstRate": 2.5 });
        let schedule = FeeSchedule::from_settings(Some(&blob));
        let pricing = compute_pricing(&dec("1000"), &schedule);
        // 10.00 * 2.5% = 0.25
        assert_eq!(pricing.gst, dec("0.25"));
    }
}
