//! Property-based tests for the statistics aggregator.

use linework_stats::{FinanceHistory, LineCost, MAX_MONTHS, RollingAverage};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Below the halving threshold the mean is the exact integer mean.
    #[test]
    fn mean_exact_without_halving(samples in proptest::collection::vec(0i64..10_000, 1..200)) {
        let mut avg = RollingAverage::new();
        let mut last = 0;
        for &s in &samples {
            last = avg.push(s);
        }
        let expected = samples.iter().sum::<i64>() / samples.len() as i64;
        prop_assert_eq!(last, expected);
        prop_assert_eq!(avg.count() as usize, samples.len());
    }

    /// Halving at a full count keeps a steady mean steady.
    #[test]
    fn halving_preserves_steady_mean(m in 0u32..60_000) {
        let mut avg = RollingAverage::from_parts(m * u16::MAX as u32, u16::MAX);
        prop_assert_eq!(avg.push(m as i64), m as i64);
        prop_assert!(avg.count() < u16::MAX);
    }

    /// The mean stays within the range of the samples pushed.
    #[test]
    fn mean_bounded_by_samples(samples in proptest::collection::vec(0i64..5_000_000, 1..500)) {
        let mut avg = RollingAverage::new();
        let max = samples.iter().copied().max().unwrap_or(0);
        for &s in &samples {
            let mean = avg.push(s);
            prop_assert!(mean >= 0 && mean <= max);
        }
    }

    /// A booked value walks back one month per rollover and drops out
    /// after the history depth.
    #[test]
    fn history_shifts_then_evicts(amount in 1i64..1_000_000, months in 0usize..20) {
        let mut h: FinanceHistory<LineCost> = FinanceHistory::new();
        h.book(amount, LineCost::Distance);
        for _ in 0..months {
            h.new_month();
        }
        let expected = if months < MAX_MONTHS { amount } else { 0 };
        prop_assert_eq!(h.get(months, LineCost::Distance), expected);
        let total: i64 = h.column(LineCost::Distance).iter().sum();
        prop_assert_eq!(total, expected);
    }
}
