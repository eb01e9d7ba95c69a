#![allow(dead_code)]

use volume_profile_engine::historical::Candle;

/// One-minute candle starting at `timestamp` spanning `low..=high`
pub fn create_sample_candle(timestamp: i64, low: f64, high: f64, close: f64, volume: f64) -> Candle {
    Candle::new(high, low, close, volume)
        .with_open_time(timestamp)
        .with_open((high + low) / 2.0)
}

/// `count` identical candles
pub fn create_identical_candles(count: usize, low: f64, high: f64, volume: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| create_sample_candle(1_700_000_000_000 + i as i64 * 60_000, low, high, (low + high) / 2.0, volume))
        .collect()
}

/// Deterministic random-walk series around `base_price`
pub fn create_candle_series(count: usize, base_price: f64) -> Vec<Candle> {
    let mut price = base_price;
    (0..count)
        .map(|i| {
            let step = ((i as f64 * 0.7).sin() + (i as f64 * 0.13).cos()) * base_price * 0.002;
            let open = price;
            price = (price + step).max(base_price * 0.1);
            let spread = base_price * 0.001 * (1 + i % 5) as f64;
            let high = open.max(price) + spread;
            let low = open.min(price) - spread;
            let volume = 10.0 + ((i * 37) % 101) as f64;
            create_sample_candle(1_700_000_000_000 + i as i64 * 60_000, low, high, price, volume)
        })
        .collect()
}

/// Candle CSV with a header row, the format the data-fetch layer exports
pub fn create_sample_csv(candles: &[Candle]) -> String {
    let mut csv = String::from("open_time,open,high,low,close,volume\n");
    for c in candles {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.open_time.unwrap_or_default(),
            c.open.unwrap_or(c.close),
            c.high,
            c.low,
            c.close,
            c.volume
        ));
    }
    csv
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance * expected.abs().max(1.0),
        "expected {} got {} (tolerance {})",
        expected,
        actual,
        tolerance
    );
}
