//! Chart Viewer Widget
//! Central scrollable panel: dataset sample, year scatter and the two ranked bar charts.

use crate::charts::{ChartPlotter, YearCharts};
use crate::data::EnrichedRecord;
use crate::stats::Metric;
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;

/// Scrollable display area for the selected year.
#[derive(Default)]
pub struct ChartViewer {
    /// Overview rows, fixed for the session
    pub sample: Vec<EnrichedRecord>,
    /// Views for the currently selected year
    pub charts: Option<YearCharts>,
}

impl ChartViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.sample.clear();
        self.charts = None;
    }

    pub fn set_sample(&mut self, sample: Vec<EnrichedRecord>) {
        self.sample = sample;
    }

    pub fn set_charts(&mut self, charts: YearCharts) {
        self.charts = Some(charts);
    }

    pub fn show(&mut self, _ctx: &egui::Context, ui: &mut egui::Ui) {
        if self.sample.is_empty() && self.charts.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new("CO2-Emissions and GDP").size(26.0).strong());
                ui.horizontal_wrapped(|ui| {
                    ui.label("Exploring the CO2 emission dataset from");
                    ui.hyperlink_to(
                        "Our World in Data",
                        "https://ourworldindata.org/grapher/co2-emissions-vs-gdp",
                    );
                    ui.label(".");
                    ui.hyperlink_to("Data repository", "https://github.com/owid/co2-data/tree/master");
                });
                ui.add_space(SECTION_SPACING);

                ui.label(RichText::new("Dataset overview").size(18.0).strong());
                ui.label("The following table displays a random sample from the dataset:");
                let rows: Vec<&EnrichedRecord> = self.sample.iter().collect();
                ChartPlotter::draw_sample_table(ui, &rows);
                ui.add_space(SECTION_SPACING);

                ui.heading(RichText::new("CO2 Emissions and GDP in one year").size(22.0));
                ui.add_space(8.0);

                match &self.charts {
                    Some(charts) if !charts.is_empty() => Self::draw_year(ui, charts),
                    Some(charts) => {
                        ui.label(
                            RichText::new(format!("No records for {}", charts.year))
                                .size(16.0)
                                .color(Color32::GRAY),
                        );
                    }
                    None => {}
                }
            });
    }

    fn draw_year(ui: &mut egui::Ui, charts: &YearCharts) {
        let year = charts.year;
        ui.label(
            RichText::new(format!("CO2 emissions vs. GDP in {}", year))
                .size(18.0)
                .strong(),
        );
        ChartPlotter::draw_scatter_chart(ui, charts);
        ui.add_space(SECTION_SPACING);

        ui.columns(2, |columns| {
            columns[0].label(RichText::new("CO2 emissions per region").size(18.0).strong());
            columns[0].label(format!(
                "The following bar chart displays CO2 emissions in {} aggregated by region",
                year
            ));
            ChartPlotter::draw_region_bars(&mut columns[0], &charts.co2_totals, Metric::Co2PerCapita, year);

            columns[1].label(RichText::new("GDP per region").size(18.0).strong());
            columns[1].label(format!(
                "The following bar chart displays the Gross Domestic Product (GDP) in {} aggregated by region",
                year
            ));
            ChartPlotter::draw_region_bars(&mut columns[1], &charts.gdp_totals, Metric::GdpPerCapita, year);
        });
    }
}
