//! Synthetic indicator panels shared by the integration tests

use debt_growth::StaticSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

pub const GDP: &str = "NY.GDP.MKTP.KD.ZG";
pub const DEBT: &str = "DT.TDS.DPPF.XP.ZS";
pub const RESERVES: &str = "BN.RES.INCL.CD";
pub const CPI: &str = "FP.CPI.TOTL.ZG";
pub const EXPORT: &str = "NE.EXP.GNFS.ZS";

/// Yearly series for every economy, growth peaking at moderate debt service
#[allow(dead_code)]
pub fn synthetic_source(economies: &[&str], first_year: i32, years: usize, seed: u64) -> StaticSource {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.8).unwrap();
    let mut source = StaticSource::default();

    for economy in economies {
        let debt: Vec<f64> = (0..years).map(|_| rng.gen_range(2.0..14.0)).collect();
        let cpi: Vec<f64> = (0..years).map(|_| rng.gen_range(2.0..15.0)).collect();
        let export: Vec<f64> = (0..years).map(|_| rng.gen_range(30.0..60.0)).collect();
        let reserves: Vec<f64> = (0..years).map(|_| rng.gen_range(1.0e9..2.0e10)).collect();
        let gdp: Vec<f64> = (0..years)
            .map(|t| {
                -0.06 * debt[t] * debt[t] + 0.9 * debt[t] + 0.05 * cpi[t] + 0.02 * export[t]
                    + noise.sample(&mut rng)
            })
            .collect();

        source = source
            .with_series(GDP, economy, first_year, &gdp)
            .with_series(DEBT, economy, first_year, &debt)
            .with_series(RESERVES, economy, first_year, &reserves)
            .with_series(CPI, economy, first_year, &cpi)
            .with_series(EXPORT, economy, first_year, &export);
    }

    source
}
