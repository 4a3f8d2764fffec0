//! Chart Plotter Module
//! Interactive year views using egui_plot: region scatter, ranked bars and the sample table.

use crate::data::{EnrichedRecord, YearSelection};
use crate::stats::{aggregate_by_region, Metric, RegionTotals};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Points};
use std::collections::BTreeMap;

/// Bar color for both ranked charts
pub const BAR_COLOR: Color32 = Color32::from_rgb(31, 119, 180);

pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),  // Blue
    Color32::from_rgb(255, 127, 14),  // Orange
    Color32::from_rgb(44, 160, 44),   // Green
    Color32::from_rgb(214, 39, 40),   // Red
    Color32::from_rgb(148, 103, 189), // Purple
    Color32::from_rgb(140, 86, 75),   // Brown
    Color32::from_rgb(227, 119, 194), // Pink
    Color32::from_rgb(127, 127, 127), // Grey
    Color32::from_rgb(188, 189, 34),  // Olive
    Color32::from_rgb(23, 190, 207),  // Cyan
];

/// Everything the views need for one selected year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearCharts {
    pub year: i32,
    pub record_count: usize,
    /// Region → `[gdp_per_capita, co2_per_capita]` points.
    pub scatter: BTreeMap<String, Vec<[f64; 2]>>,
    pub co2_totals: RegionTotals,
    pub gdp_totals: RegionTotals,
}

impl YearCharts {
    pub fn from_selection(selection: &YearSelection<'_>) -> Self {
        Self {
            year: selection.year,
            record_count: selection.len(),
            scatter: Self::scatter_points(&selection.records),
            co2_totals: aggregate_by_region(selection.records.iter().copied(), Metric::Co2PerCapita),
            gdp_totals: aggregate_by_region(selection.records.iter().copied(), Metric::GdpPerCapita),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.record_count == 0
    }

    /// Points drawable on log-log axes: both values present and positive.
    fn scatter_points(records: &[&EnrichedRecord]) -> BTreeMap<String, Vec<[f64; 2]>> {
        let mut by_region: BTreeMap<String, Vec<[f64; 2]>> = BTreeMap::new();
        for r in records {
            let (Some(gdp), Some(co2)) = (r.record.gdp_per_capita, r.record.co2_per_capita) else {
                continue;
            };
            if gdp > 0.0 && co2 > 0.0 {
                by_region.entry(r.region.clone()).or_default().push([gdp, co2]);
            }
        }
        by_region
    }
}

/// Creates the interactive charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    pub fn region_color(index: usize) -> Color32 {
        PALETTE[index % PALETTE.len()]
    }

    /// Tick label for a value in thousands, e.g. `12k`.
    pub fn format_thousands(value: f64) -> String {
        format!("{:.0}k", value / 1000.0)
    }

    /// Value-axis tick label for a ranked bar chart.
    pub fn format_metric_tick(metric: Metric, value: f64) -> String {
        match metric {
            Metric::GdpPerCapita => Self::format_thousands(value),
            Metric::Co2PerCapita => format!("{:.1}", value),
        }
    }

    /// Tick label on a log10 axis, where `exponent` is the axis position.
    pub fn format_log_tick(exponent: f64) -> String {
        let v = 10f64.powf(exponent);
        if v >= 1000.0 {
            Self::format_thousands(v)
        } else if v >= 1.0 {
            format!("{:.0}", v)
        } else if v >= 0.01 {
            format!("{:.2}", v)
        } else {
            format!("{:.0e}", v)
        }
    }

    /// GDP per capita vs CO2 per capita, log-log, one series per region.
    pub fn draw_scatter_chart(ui: &mut egui::Ui, charts: &YearCharts) {
        Plot::new(format!("scatter_{}", charts.year))
            .height(360.0)
            .legend(Legend::default())
            .x_axis_label(Metric::GdpPerCapita.label())
            .y_axis_label(Metric::Co2PerCapita.label())
            .x_axis_formatter(|mark, _range| Self::format_log_tick(mark.value))
            .y_axis_formatter(|mark, _range| Self::format_log_tick(mark.value))
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (i, (region, points)) in charts.scatter.iter().enumerate() {
                    let log_points: PlotPoints = points
                        .iter()
                        .map(|&[x, y]| [x.log10(), y.log10()])
                        .collect();
                    plot_ui.points(
                        Points::new(log_points)
                            .radius(3.5)
                            .color(Self::region_color(i))
                            .name(region),
                    );
                }
            });
    }

    /// Region label for a y position on the ranked bar chart.
    ///
    /// Ranked element `i` sits at `y = i`, so the smallest total is at the
    /// bottom and the largest at the top.
    pub fn bar_label(labels: &[String], position: f64) -> Option<&str> {
        let idx = position.round();
        if (position - idx).abs() > 1e-6 || idx < 0.0 {
            return None;
        }
        labels.get(idx as usize).map(String::as_str)
    }

    /// Horizontal bars of region totals, largest at the top.
    pub fn draw_region_bars(ui: &mut egui::Ui, totals: &RegionTotals, metric: Metric, year: i32) {
        if let Some(warning) = totals.empty_warning(year) {
            ui.label(RichText::new(warning.to_string()).color(Color32::GRAY));
            return;
        }
        let ranked = totals.ranked_ascending();
        let labels: Vec<String> = ranked.iter().map(|(region, _)| region.to_string()).collect();

        let bars: Vec<Bar> = ranked
            .iter()
            .enumerate()
            .map(|(i, (region, total))| {
                Bar::new(i as f64, *total)
                    .name(*region)
                    .width(0.7)
                    .fill(BAR_COLOR)
            })
            .collect();

        Plot::new(format!("bars_{}_{}", metric, year))
            .height(280.0)
            .x_axis_label(metric.label())
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .show_grid([true, false])
            .y_axis_formatter(move |mark, _range| {
                Self::bar_label(&labels, mark.value)
                    .unwrap_or_default()
                    .to_string()
            })
            .x_axis_formatter(move |mark, _range| Self::format_metric_tick(metric, mark.value))
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).horizontal().name(metric.column()));
            });
    }

    /// Sample table of enriched records.
    pub fn draw_sample_table(ui: &mut egui::Ui, rows: &[&EnrichedRecord]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("sample_table")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        for header in [
                            "Country",
                            "ISO",
                            "Year",
                            "Population",
                            "CO2",
                            "GDP",
                            "CO2 / capita",
                            "GDP / capita",
                            "Region",
                        ] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in rows {
                            let r = &row.record;
                            ui.label(RichText::new(&r.country).size(11.0));
                            ui.label(RichText::new(r.iso_code.as_deref().unwrap_or("-")).size(11.0));
                            ui.label(RichText::new(r.year.to_string()).size(11.0));
                            ui.label(RichText::new(format_cell(r.population, 0)).size(11.0));
                            ui.label(RichText::new(format_cell(r.co2, 3)).size(11.0));
                            ui.label(RichText::new(format_cell(r.gdp, 0)).size(11.0));
                            ui.label(RichText::new(format_cell(r.co2_per_capita, 3)).size(11.0));
                            ui.label(RichText::new(format_cell(r.gdp_per_capita, 1)).size(11.0));
                            ui.label(RichText::new(&row.region).size(11.0));
                            ui.end_row();
                        }
                    });
            });
    }
}

/// Table cell text; missing values show as `-`.
pub fn format_cell(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{:.*}", decimals, v))
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CountryYearRecord, DataProcessor, RegionMapping};

    #[test]
    fn scatter_skips_points_not_drawable_on_log_axes() {
        let emissions: Vec<CountryYearRecord> = [
            ("A", Some(1000.0), Some(500000.0), Some(0.1)),
            ("B", Some(0.0), Some(1.0), Some(0.5)),
            ("C", Some(10.0), Some(100.0), Some(0.0)),
        ]
        .iter()
        .map(|&(iso, population, gdp, co2_per_capita)| CountryYearRecord {
            country: iso.to_string(),
            iso_code: Some(iso.to_string()),
            year: 2000,
            population,
            co2: None,
            gdp,
            co2_per_capita,
            gdp_per_capita: None,
        })
        .collect();
        let regions: Vec<RegionMapping> = ["A", "B", "C"]
            .iter()
            .map(|iso| RegionMapping {
                iso_code: iso.to_string(),
                region: "X".to_string(),
            })
            .collect();
        let dataset = DataProcessor::prepare(&emissions, &regions);
        let charts = YearCharts::from_selection(&dataset.filter_by_year(2000));

        assert_eq!(charts.record_count, 3);
        assert_eq!(charts.scatter.get("X"), Some(&vec![[500.0, 0.1]]));
        assert_eq!(charts.co2_totals.get("X"), Some(0.6));
        assert_eq!(charts.gdp_totals.get("X"), Some(510.0));
    }

    #[test]
    fn largest_region_bar_is_at_the_top() {
        let totals = RegionTotals {
            metric: Some(Metric::GdpPerCapita),
            record_count: 2,
            totals: BTreeMap::from([("S".to_string(), 0.0), ("E".to_string(), 500.0)]),
        };
        let labels: Vec<String> = totals
            .ranked_ascending()
            .iter()
            .map(|(region, _)| region.to_string())
            .collect();

        assert_eq!(ChartPlotter::bar_label(&labels, 0.0), Some("S"));
        assert_eq!(ChartPlotter::bar_label(&labels, 1.0), Some("E"));
        assert_eq!(ChartPlotter::bar_label(&labels, 0.5), None);
        assert_eq!(ChartPlotter::bar_label(&labels, 2.0), None);
        assert_eq!(ChartPlotter::bar_label(&labels, -1.0), None);
    }

    #[test]
    fn tick_labels() {
        assert_eq!(ChartPlotter::format_thousands(12_345.0), "12k");
        assert_eq!(ChartPlotter::format_log_tick(4.0), "10k");
        assert_eq!(ChartPlotter::format_log_tick(1.0), "10");
        assert_eq!(ChartPlotter::format_log_tick(-1.0), "0.10");
        assert_eq!(ChartPlotter::format_metric_tick(Metric::Co2PerCapita, 0.26), "0.3");
        assert_eq!(ChartPlotter::format_metric_tick(Metric::Co2PerCapita, 0.5), "0.5");
        assert_eq!(ChartPlotter::format_metric_tick(Metric::GdpPerCapita, 12_000.0), "12k");
        assert_eq!(format_cell(None, 2), "-");
        assert_eq!(format_cell(Some(0.1234), 2), "0.12");
    }
}
