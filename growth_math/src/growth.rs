//! Growth-rate compounding

/// Gross growth factor of a percentage rate, `1 + rate / 100`
pub fn growth_factor(rate_percent: f64) -> f64 {
    1.0 + rate_percent / 100.0
}

/// Running product of growth factors starting from a base of 1.0
///
/// The k-th entry is the level reached after k + 1 periods, so a single
/// period of 5% growth yields `[1.05]`. A missing rate poisons every later
/// entry.
pub fn cumulative_growth_index(rates_percent: &[f64]) -> Vec<f64> {
    rates_percent
        .iter()
        .scan(1.0, |level, &rate| {
            *level *= growth_factor(rate);
            Some(*level)
        })
        .collect()
}
