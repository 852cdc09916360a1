//! Criterion benchmarks for ledgerline hot paths.
//!
//! Benchmarks:
//! 1. Tick loop with a crossover strategy and trailing-stop risk rules
//! 2. Indicator precompute across instruments
//! 3. Portfolio order commit and mark updates

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

use ledgerline_core::components::{FnStrategy, Indicator, IndicatorSet, PortfolioManager};
use ledgerline_core::domain::{Candle, Order, Portfolio, Prices, Side, Tick};
use ledgerline_core::engine::Runner;
use ledgerline_core::indicators::{Ema, Sma};
use ledgerline_core::risk::{RiskSettings, StandardRiskManager};
use ledgerline_core::PriceHistory;

// ── Helpers ──────────────────────────────────────────────────────────

fn make_history(ticks: usize, instruments: usize) -> PriceHistory {
    let base = Utc.with_ymd_and_hms(2020, 1, 2, 16, 0, 0).unwrap();
    let mut history = PriceHistory::new();
    for s in 0..instruments {
        let symbol = format!("SYM{s}");
        for i in 0..ticks {
            let close = 100.0 + ((i + s * 7) as f64 * 0.1).sin() * 10.0;
            let candle = Candle::new(
                base + Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000,
            );
            history.add_candle(symbol.as_str(), candle).unwrap();
        }
    }
    history
}

fn indicator_set() -> IndicatorSet {
    let indicators: Vec<Arc<dyn Indicator>> = vec![Arc::new(Sma::new(20)), Arc::new(Ema::new(50))];
    IndicatorSet::new(indicators).unwrap()
}

fn crossover(_: chrono::DateTime<Utc>, tick: &Tick, pm: &dyn PortfolioManager) -> Vec<Order> {
    let mut orders = Vec::new();
    for (symbol, candle) in tick {
        let (Some(fast), Some(slow)) = (candle.indicator("sma_20"), candle.indicator("ema_50")) else {
            continue;
        };
        match pm.position(symbol) {
            None if fast > slow => orders.extend(Order::entry(symbol.as_str(), Side::Long, 10)),
            Some(pos) if fast < slow => {
                orders.extend(Order::exit(symbol.as_str(), Side::Short, pos.quantity()))
            }
            _ => {}
        }
    }
    orders
}

fn run_once(history: PriceHistory) -> usize {
    let risk = StandardRiskManager::new(RiskSettings::default().with_trailing_stop(0.05)).unwrap();
    let mut runner = Runner::new()
        .with_strategy(FnStrategy::new(crossover))
        .with_portfolio(Portfolio::with_capital(1_000_000.0))
        .with_risk_manager(risk)
        .with_data(history)
        .with_indicators(indicator_set());
    runner.run().unwrap();
    runner.equity_curve().len()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_tick_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick_loop");

    for &ticks in &[252, 1260, 2520] {
        let history = make_history(ticks, 1);
        group.bench_with_input(BenchmarkId::new("crossover_1_symbol", ticks), &ticks, |b, _| {
            b.iter(|| run_once(black_box(history.clone())));
        });
    }

    let history = make_history(1260, 10);
    group.bench_function("crossover_10_symbols_1260_ticks", |b| {
        b.iter(|| run_once(black_box(history.clone())));
    });

    group.finish();
}

fn bench_indicators(c: &mut Criterion) {
    let mut group = c.benchmark_group("indicator_precompute");
    let set = indicator_set();

    for &instruments in &[1, 10, 50] {
        let history = make_history(1260, instruments);
        group.bench_with_input(
            BenchmarkId::new("sma_ema_1260_ticks", instruments),
            &instruments,
            |b, _| {
                b.iter(|| {
                    let mut history = history.clone();
                    history.apply_indicators(black_box(&set)).unwrap();
                    history
                });
            },
        );
    }

    group.finish();
}

fn bench_portfolio(c: &mut Criterion) {
    let mut group = c.benchmark_group("portfolio");
    let at = Utc.with_ymd_and_hms(2020, 1, 2, 16, 0, 0).unwrap();

    group.bench_function("commit_100_round_trips", |b| {
        b.iter(|| {
            let mut portfolio = Portfolio::with_capital(1_000_000.0);
            for i in 0..100 {
                let price = 100.0 + i as f64;
                let entry = Order::entry("SPY", Side::Long, 10).unwrap().filled(price, at).unwrap();
                let exit = Order::exit("SPY", Side::Short, 10)
                    .unwrap()
                    .filled(price + 1.0, at)
                    .unwrap();
                portfolio.process_order(&entry).unwrap();
                portfolio.process_order(&exit).unwrap();
            }
            black_box(portfolio.cash())
        });
    });

    group.bench_function("mark_50_positions", |b| {
        let mut portfolio = Portfolio::with_capital(1_000_000_000.0);
        let mut prices = Prices::new();
        for s in 0..50 {
            let symbol = format!("SYM{s}");
            let entry = Order::entry(symbol.as_str(), Side::Long, 10)
                .unwrap()
                .filled(100.0, at)
                .unwrap();
            portfolio.process_order(&entry).unwrap();
            prices.insert(symbol, 101.0);
        }
        b.iter(|| {
            portfolio.update_positions(black_box(&prices));
            black_box(portfolio.value())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_tick_loop, bench_indicators, bench_portfolio);
criterion_main!(benches);
