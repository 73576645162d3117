use debt_growth::config::YearRange;
use debt_growth::{pipeline, AnalysisConfig, StaticSource};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Debt Growth: Offline Analysis Example");
    println!("=====================================\n");

    let config = AnalysisConfig {
        year_range: YearRange::new(1995, 2021)?,
        output_dir: std::env::temp_dir().join("debt_growth_example"),
        ..AnalysisConfig::default()
    };

    println!("Creating a synthetic panel for {:?}...", config.economies);
    let source = create_sample_source(&config)?;
    println!("{} observations created\n", source.len());

    let report = pipeline::run(&config, &source)?;
    println!("{}", report);

    for chart in &report.charts {
        println!("Chart written to {}", chart.display());
    }

    Ok(())
}

// Growth peaks around 7.5% debt service; the other indicators add noise
fn create_sample_source(config: &AnalysisConfig) -> Result<StaticSource, Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(2021);
    let shock = Normal::new(0.0, 1.5)?;
    let years = config.year_range.len();
    let start = config.year_range.start;

    let mut source = StaticSource::default();
    for economy in &config.economies {
        let debt: Vec<f64> = (0..years).map(|_| rng.gen_range(1.0..16.0)).collect();
        let cpi: Vec<f64> = (0..years).map(|_| rng.gen_range(2.0..40.0)).collect();
        let export: Vec<f64> = (0..years).map(|_| rng.gen_range(25.0..65.0)).collect();
        let reserves: Vec<f64> = (0..years).map(|_| rng.gen_range(5.0e8..3.0e10)).collect();

        let mut growth = Vec::with_capacity(years);
        let mut previous = 0.0;
        for t in 0..years {
            let value = 0.3 * previous - 0.08 * debt[t] * debt[t] + 1.2 * debt[t]
                - 0.02 * cpi[t]
                + shock.sample(&mut rng);
            growth.push(value);
            previous = value;
        }

        source = source
            .with_series("NY.GDP.MKTP.KD.ZG", economy, start, &growth)
            .with_series("DT.TDS.DPPF.XP.ZS", economy, start, &debt)
            .with_series("BN.RES.INCL.CD", economy, start, &reserves)
            .with_series("FP.CPI.TOTL.ZG", economy, start, &cpi)
            .with_series("NE.EXP.GNFS.ZS", economy, start, &export);
    }

    Ok(source)
}
