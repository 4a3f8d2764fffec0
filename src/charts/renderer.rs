//! Static Chart Renderer
//! Draws the year views with plotters into an RGB buffer and encodes them as PNG.
//!
//! Output per year:
//! 1. `scatter_<year>.png`: GDP vs CO2 per capita, log-log, colored by region
//! 2. `co2_per_region_<year>.png`: ranked horizontal bars
//! 3. `gdp_per_region_<year>.png`: ranked horizontal bars, axis in thousands

use crate::charts::{ChartPlotter, YearCharts};
use crate::stats::{Metric, RegionTotals};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const BAR: RGBColor = RGBColor(31, 119, 180);

const REGION_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Failed to encode PNG: {0}")]
    Image(#[from] image::ImageError),
    #[error("Failed to write chart: {0}")]
    Io(#[from] std::io::Error),
    #[error("No data to render for {0}")]
    Empty(i32),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Write all three charts for the year into `dir`.
    pub fn export_year(charts: &YearCharts, dir: &Path, width: u32, height: u32) -> Result<Vec<PathBuf>, RenderError> {
        if charts.is_empty() {
            return Err(RenderError::Empty(charts.year));
        }
        std::fs::create_dir_all(dir)?;

        let year = charts.year;
        let outputs = [
            (
                dir.join(format!("scatter_{}.png", year)),
                Self::render_scatter_to_bytes(charts, width, height)?,
            ),
            (
                dir.join(format!("co2_per_region_{}.png", year)),
                Self::render_region_bars_to_bytes(&charts.co2_totals, Metric::Co2PerCapita, year, width, height)?,
            ),
            (
                dir.join(format!("gdp_per_region_{}.png", year)),
                Self::render_region_bars_to_bytes(&charts.gdp_totals, Metric::GdpPerCapita, year, width, height)?,
            ),
        ];

        let mut paths = Vec::with_capacity(outputs.len());
        for (path, png) in outputs {
            std::fs::write(&path, png)?;
            info!("wrote {}", path.display());
            paths.push(path);
        }
        Ok(paths)
    }

    /// Scatter of every drawable point, one colored series per region.
    pub fn render_scatter_to_bytes(charts: &YearCharts, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let points: Vec<[f64; 2]> = charts.scatter.values().flatten().copied().collect();
        if points.is_empty() {
            return Err(RenderError::Empty(charts.year));
        }
        let (x_range, y_range) = Self::log_bounds(&points);

        Self::render(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(
                    format!("CO2 emissions vs. GDP in {}", charts.year),
                    ("sans-serif", 26),
                )
                .margin(15)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(x_range.log_scale(), y_range.log_scale())?;

            chart
                .configure_mesh()
                .x_desc(Metric::GdpPerCapita.label())
                .y_desc(Metric::Co2PerCapita.label())
                .x_label_formatter(&|v| format!("{:.0}", v / 1000.0))
                .draw()?;

            for (i, (region, pts)) in charts.scatter.iter().enumerate() {
                let color = REGION_COLORS[i % REGION_COLORS.len()];
                chart
                    .draw_series(
                        pts.iter()
                            .map(move |&[x, y]| Circle::new((x, y), 4, color.filled())),
                    )?
                    .label(region.as_str())
                    .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .background_style(WHITE.mix(0.85))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })
    }

    /// Ranked bars, largest total at the top.
    pub fn render_region_bars_to_bytes(
        totals: &RegionTotals,
        metric: Metric,
        year: i32,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if let Some(warning) = totals.empty_warning(year) {
            return Err(RenderError::Empty(warning.year));
        }
        let ranked = totals.ranked_ascending();
        let n = ranked.len() as i32;
        let max = ranked
            .iter()
            .map(|(_, v)| *v)
            .fold(0.0f64, f64::max)
            .max(f64::MIN_POSITIVE);
        let title = match metric {
            Metric::Co2PerCapita => format!("CO2 emissions per region in {}", year),
            Metric::GdpPerCapita => format!("GDP per region in {}", year),
        };

        Self::render(width, height, |root| {
            let mut chart = ChartBuilder::on(root)
                .caption(title, ("sans-serif", 26))
                .margin(15)
                .x_label_area_size(45)
                .y_label_area_size(260)
                .build_cartesian_2d(0.0..max * 1.05, (0..n).into_segmented())?;

            let label_at = |v: &SegmentValue<i32>| Self::segment_label(&ranked, v);

            chart
                .configure_mesh()
                .disable_y_mesh()
                .x_desc(metric.label())
                .y_labels(ranked.len())
                .y_label_formatter(&label_at)
                .x_label_formatter(&|v| ChartPlotter::format_metric_tick(metric, *v))
                .draw()?;

            chart.draw_series(ranked.iter().enumerate().map(|(i, (_, total))| {
                let row = i as i32;
                let mut bar = Rectangle::new(
                    [(0.0, SegmentValue::Exact(row)), (*total, SegmentValue::Exact(row + 1))],
                    BAR.filled(),
                );
                bar.set_margin(4, 4, 0, 0);
                bar
            }))?;
            Ok(())
        })
    }

    /// Label of a bar row. Segment 0 is the bottom row and holds the smallest total.
    fn segment_label(ranked: &[(&str, f64)], v: &SegmentValue<i32>) -> String {
        match v {
            SegmentValue::CenterOf(i) if *i >= 0 => ranked
                .get(*i as usize)
                .map(|(region, _)| region.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Axis ranges padded by a factor of two on each side.
    fn log_bounds(points: &[[f64; 2]]) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
        let mut x = (f64::INFINITY, f64::NEG_INFINITY);
        let mut y = (f64::INFINITY, f64::NEG_INFINITY);
        for &[px, py] in points {
            x = (x.0.min(px), x.1.max(px));
            y = (y.0.min(py), y.1.max(py));
        }
        ((x.0 / 2.0)..(x.1 * 2.0), (y.0 / 2.0)..(y.1 * 2.0))
    }

    fn render<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>, RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<(), RenderError>,
    {
        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)?;
            draw(&root)?;
            root.present()?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Draw("buffer size mismatch".to_string()))?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_year_is_not_rendered() {
        let charts = YearCharts {
            year: 1750,
            ..Default::default()
        };
        let dir = std::env::temp_dir().join("co2_explorer_render_test");
        assert!(matches!(
            StaticChartRenderer::export_year(&charts, &dir, 400, 300),
            Err(RenderError::Empty(1750))
        ));
    }

    #[test]
    fn bottom_row_holds_the_smallest_total() {
        let ranked = [("S", 0.0), ("E", 500.0)];
        let label = |i| StaticChartRenderer::segment_label(&ranked, &SegmentValue::CenterOf(i));
        assert_eq!(label(0), "S");
        assert_eq!(label(1), "E");
        assert_eq!(label(2), "");
        assert_eq!(label(-1), "");
        assert_eq!(
            StaticChartRenderer::segment_label(&ranked, &SegmentValue::Exact(0)),
            ""
        );
    }

    #[test]
    fn log_bounds_pad_both_axes() {
        let (x, y) = StaticChartRenderer::log_bounds(&[[100.0, 0.5], [1000.0, 4.0]]);
        assert_eq!(x, 50.0..2000.0);
        assert_eq!(y, 0.25..8.0);
    }

    #[test]
    fn empty_totals_are_not_rendered() {
        let totals = RegionTotals {
            metric: Some(Metric::Co2PerCapita),
            totals: BTreeMap::new(),
            record_count: 0,
        };
        assert!(matches!(
            StaticChartRenderer::render_region_bars_to_bytes(&totals, Metric::Co2PerCapita, 2000, 400, 300),
            Err(RenderError::Empty(2000))
        ));
    }
}
