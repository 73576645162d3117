//! SVG charts of the fitted curve and the scenario indices

use crate::config::CurveGrid;
use crate::error::{AnalysisError, Result};
use crate::models::laffer::{CurveData, CurveFit};
use crate::scenarios::ScenarioTable;
use growth_math::linspace;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the curve chart
pub const LAFFER_CURVE_FILE: &str = "laffer_curve.svg";
/// File name of the scenario chart
pub const SCENARIOS_FILE: &str = "scenarios.svg";

const SIZE: (u32, u32) = (800, 600);

fn plot_error<E: std::fmt::Display>(e: E) -> AnalysisError {
    AnalysisError::PlotError(e.to_string())
}

/// Finite bounds of some values, padded by 5%
fn padded_bounds<'a>(values: impl Iterator<Item = &'a f64>) -> Result<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if !lo.is_finite() {
        return Err(AnalysisError::PlotError(
            "Nothing finite to plot".to_string(),
        ));
    }
    let pad = if hi > lo { 0.05 * (hi - lo) } else { 1.0 };
    Ok((lo - pad, hi + pad))
}

fn prepare(dir: &Path, file: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    Ok(dir.join(file))
}

/// Draw the observations and the fitted curve over the grid
pub fn render_laffer_curve(
    fit: &CurveFit,
    data: &CurveData,
    grid: &CurveGrid,
    x_label: &str,
    y_label: &str,
    dir: &Path,
) -> Result<PathBuf> {
    let path = prepare(dir, LAFFER_CURVE_FILE)?;

    let xs = linspace(grid.start, grid.end, grid.points);
    let curve = fit.curve.evaluate_all(&xs);
    let (y_lo, y_hi) = padded_bounds(curve.iter().chain(&data.y))?;
    let x_hi = data.x.iter().copied().fold(grid.end, f64::max);
    let x_lo = data.x.iter().copied().fold(grid.start, f64::min);

    {
        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Debt service and GDP growth", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc(x_label)
            .y_desc(y_label)
            .draw()
            .map_err(plot_error)?;

        chart
            .draw_series(
                data.x
                    .iter()
                    .zip(&data.y)
                    .map(|(&x, &y)| Circle::new((x, y), 3, BLUE.filled())),
            )
            .map_err(plot_error)?
            .label("data")
            .legend(|(x, y)| Circle::new((x, y), 3, BLUE.filled()));

        chart
            .draw_series(LineSeries::new(
                xs.iter().copied().zip(curve.iter().copied()),
                RED.stroke_width(2),
            ))
            .map_err(plot_error)?
            .label(fit.curve.label())
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED.stroke_width(2)));

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }

    info!(path = %path.display(), "rendered curve chart");
    Ok(path)
}

/// Draw one cumulative index line per scenario
pub fn render_scenarios(table: &ScenarioTable, dir: &Path) -> Result<PathBuf> {
    let path = prepare(dir, SCENARIOS_FILE)?;

    let forecasts = table.forecasts();
    let years = forecasts
        .first()
        .map(|f| f.years().to_vec())
        .unwrap_or_default();
    let (first_year, last_year) = match (years.first(), years.last()) {
        (Some(&first), Some(&last)) => (first, last.max(first + 1)),
        _ => {
            return Err(AnalysisError::PlotError(
                "Scenario table has no years".to_string(),
            ))
        }
    };
    let (y_lo, y_hi) = padded_bounds(forecasts.iter().flat_map(|f| f.index().iter()))?;

    {
        let root = SVGBackend::new(&path, SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(plot_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Cumulative GDP growth by scenario", ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(first_year..last_year, y_lo..y_hi)
            .map_err(plot_error)?;

        chart
            .configure_mesh()
            .x_desc("year")
            .y_desc("cumulative growth index")
            .draw()
            .map_err(plot_error)?;

        for (i, forecast) in forecasts.iter().enumerate() {
            let color = Palette99::pick(i);
            chart
                .draw_series(LineSeries::new(
                    forecast
                        .years()
                        .iter()
                        .copied()
                        .zip(forecast.index().iter().copied()),
                    color.stroke_width(2),
                ))
                .map_err(plot_error)?
                .label(forecast.name())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
    }

    info!(path = %path.display(), "rendered scenario chart");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bounds() {
        let values = [1.0, f64::NAN, 3.0];
        let (lo, hi) = padded_bounds(values.iter()).unwrap();
        assert!((lo - 0.9).abs() < 1e-12);
        assert!((hi - 3.1).abs() < 1e-12);

        let (lo, hi) = padded_bounds([2.0].iter()).unwrap();
        assert_eq!((lo, hi), (1.0, 3.0));

        assert!(padded_bounds([f64::NAN].iter()).is_err());
    }
}
