//! Property tests for the performance metrics.

use ledgerline_runner::metrics::{max_drawdown, period_returns, profit_factor, total_return, win_rate};
use proptest::prelude::*;

fn positive_curve() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..1_000_000.0, 2..64)
}

proptest! {
    #[test]
    fn drawdown_is_a_fraction_of_the_peak(equity in positive_curve()) {
        let dd = max_drawdown(&equity);
        prop_assert!(dd <= 0.0);
        prop_assert!(dd > -1.0);
    }

    #[test]
    fn compounded_returns_equal_total_return(equity in positive_curve()) {
        let compounded = period_returns(&equity)
            .iter()
            .fold(1.0, |acc, r| acc * (1.0 + r))
            - 1.0;
        let total = total_return(&equity);
        prop_assert!((compounded - total).abs() <= 1e-6 * (1.0 + total.abs()));
    }

    #[test]
    fn trade_statistics_stay_in_range(pnls in prop::collection::vec(-1_000.0f64..1_000.0, 0..50)) {
        let rate = win_rate(&pnls);
        prop_assert!((0.0..=1.0).contains(&rate));
        let pf = profit_factor(&pnls);
        prop_assert!((0.0..=100.0).contains(&pf));
    }
}
