//! Control Panel Widget
//! Left side panel: data source status, year selection and export.

use crate::data::Sources;
use egui::{Color32, RichText};
use std::ops::RangeInclusive;

/// Left side control panel with the year slider and status line.
pub struct ControlPanel {
    pub year: i32,
    pub year_range: Option<RangeInclusive<i32>>,
    pub sources: Sources,
    pub record_count: usize,
    pub dropped_unmapped: usize,
    pub progress: f32,
    pub status: String,
    pub failed: bool,
}

impl ControlPanel {
    pub fn new(sources: Sources, default_year: i32) -> Self {
        Self {
            year: default_year,
            year_range: None,
            sources,
            record_count: 0,
            dropped_unmapped: 0,
            progress: 0.0,
            status: "Ready".to_string(),
            failed: false,
        }
    }

    /// Bind the slider to the observed years, keeping the current year if it fits.
    pub fn set_year_range(&mut self, range: RangeInclusive<i32>) {
        self.year = clamp_year(self.year, &range);
        self.year_range = Some(range);
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🌍 CO2 Explorer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Emissions & GDP by region")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new("Emissions").size(11.0).strong());
                ui.label(RichText::new(&self.sources.emissions_url).size(10.0).color(Color32::GRAY));
                ui.add_space(4.0);
                ui.label(RichText::new("Regions").size(11.0).strong());
                ui.label(RichText::new(&self.sources.regions_url).size(10.0).color(Color32::GRAY));
                if self.record_count > 0 {
                    ui.add_space(6.0);
                    ui.label(
                        RichText::new(format!(
                            "{} records, {} without region dropped",
                            self.record_count, self.dropped_unmapped
                        ))
                        .size(11.0),
                    );
                }
            });

        if self.failed {
            ui.add_space(5.0);
            ui.vertical_centered(|ui| {
                if ui.button("🔄 Retry").clicked() {
                    action = ControlPanelAction::Reload;
                }
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Year Section =====
        ui.label(RichText::new("📅 Year").size(14.0).strong());
        ui.add_space(8.0);

        match self.year_range.clone() {
            Some(range) => {
                let slider = egui::Slider::new(&mut self.year, range).text("Select the year");
                if ui.add(slider).changed() {
                    action = ControlPanelAction::YearChanged;
                }
            }
            None => {
                ui.label(RichText::new("Waiting for data...").color(Color32::GRAY));
            }
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Action Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.year_range.is_some(), |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export PNG").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.progress > 0.0 && self.progress < 100.0),
        );

        ui.add_space(5.0);

        let status_color = if self.failed || self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.progress >= 100.0 {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Keep a requested year inside the observed range.
pub fn clamp_year(year: i32, range: &RangeInclusive<i32>) -> i32 {
    year.clamp(*range.start(), *range.end())
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    YearChanged,
    ExportPng,
    Reload,
}
