use aurovest_backend::services::pricing::{
    compute_pricing, grams_for, to_minor_units, FeeSchedule,
};
use bigdecimal::BigDecimal;
use std::str::FromStr;

fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).expect("test decimal")
}

#[test]
fn thousand_rupees_at_six_thousand_per_gram_buys_point_1667_grams() {
    let grams = grams_for(&dec("1000"), &dec("6000"));
    assert_eq!(grams, dec("0.1667"));
}

#[test]
fn gst_only_schedule_leaves_total_at_base_amount() {
    // price=6000, spreadBps=0, convenienceFeeBps=0, gstRate=3, amount=1000
    // GST applies to the convenience fee, which is zero
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
    assert_eq!(grams_for(&dec("1000"), &dec("6000")), dec("0.1667"));
}

#[test]
fn standard_fee_schedule_reference_totals() {
    // amount=1000, spreadBps=50 (0.5%), convenienceFeeBps=100 (1%), gstRate=3
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
fn total_payable_never_undercuts_base_amount() {
    let schedules = [
        FeeSchedule {
            spread_bps: 0,
            convenience_fee_bps: 0,
            gst_rate: BigDecimal::from(3),
        },
        FeeSchedule {
            spread_bps: 50,
            convenience_fee_bps: 100,
            gst_rate: BigDecimal::from(3),
        },
        FeeSchedule {
            spread_bps: 200,
            convenience_fee_bps: 150,
            gst_rate: BigDecimal::from(18),
        },
    ];
    for schedule in &schedules {
        for amount in ["10", "100", "999.99", "50000"] {
            let pricing = compute_pricing(&dec(amount), schedule);
            assert!(
                pricing.total_payable >= pricing.base_amount,
                "total {} < base {} for schedule {:?}",
                pricing.total_payable,
                pricing.base_amount,
                schedule
            );
        }
    }
}

#[test]
fn minor_unit_conversion_rounds_half_up() {
    assert_eq!(to_minor_units(&dec("1015.30")), 101530);
    assert_eq!(to_minor_units(&dec("1000.00")), 100000);
    assert_eq!(to_minor_units(&dec("10.005")), 1001);
}

#[test]
fn grams_precision_is_exactly_four_decimals() {
    // 2500 / 6123.45 = 0.40826... -> 0.4083
    let grams = grams_for(&dec("2500"), &dec("6123.45"));
    assert_eq!(grams, dec("0.4083"));

    // A value that rounds down: 100 / 7000 = 0.0142857... -> 0.0143
    let grams = grams_for(&dec("100"), &dec("7000"));
    assert_eq!(grams, dec("0.0143"));
}

#[test]
fn metadata_blob_carries_full_breakdown() {
    let schedule = FeeSchedule {
        spread_bps: 50,
        convenience_fee_bps: 100,
        gst_rate: BigDecimal::from(3),
    };
    let pricing = compute_pricing(&dec("1000"), &schedule);
    let metadata = pricing.metadata(&schedule);

    let blob = metadata.get("pricing").expect("pricing key present");
    assert_eq!(blob["baseAmount"], "1000.00");
    assert_eq!(blob["spread"], "5.00");
    assert_eq!(blob["convenienceFee"], "10.00");
    assert_eq!(blob["gst"], "0.30");
    assert_eq!(blob["totalPayable"], "1015.30");
    assert_eq!(blob["spreadBps"], 50);
    assert_eq!(blob["convBps"], 100);
}
