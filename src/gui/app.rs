//! CO2 Explorer Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{StaticChartRenderer, YearCharts};
use crate::config::AppConfig;
use crate::data::{DataLoader, DataProcessor, EnrichedDataset, HttpFetcher, SourceFetcher};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

const EXPORT_WIDTH: u32 = 1200;
const EXPORT_HEIGHT: u32 = 800;

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Arc<EnrichedDataset>),
    Error(String),
}

/// Main application window.
pub struct ExplorerApp<F: SourceFetcher + 'static = HttpFetcher> {
    config: AppConfig,
    loader: Arc<DataLoader<F>>,
    dataset: Option<Arc<EnrichedDataset>>,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl<F: SourceFetcher + 'static> ExplorerApp<F> {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig, loader: DataLoader<F>) -> Self {
        let control_panel = ControlPanel::new(loader.sources().clone(), config.default_year);
        let mut app = Self {
            config,
            loader: Arc::new(loader),
            dataset: None,
            control_panel,
            chart_viewer: ChartViewer::new(),
            load_rx: None,
            is_loading: false,
        };
        app.start_loading();
        app
    }

    /// Fetch and prepare in a background thread.
    fn start_loading(&mut self) {
        if self.is_loading {
            return;
        }

        self.chart_viewer.clear();
        self.control_panel.failed = false;
        self.control_panel.set_progress(5.0, "Fetching data...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let loader = Arc::clone(&self.loader);

        thread::spawn(move || Self::run_loading(tx, loader));
    }

    /// Runs on the background thread. Send errors only mean the window closed.
    fn run_loading(tx: Sender<LoadResult>, loader: Arc<DataLoader<F>>) {
        let (emissions, regions) = match loader.load_all() {
            Ok(tables) => tables,
            Err(e) => {
                error!("loading failed: {}", e);
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(60.0, "Joining regions...".to_string()));
        let dataset = DataProcessor::prepare(&emissions, &regions);
        let _ = tx.send(LoadResult::Complete(Arc::new(dataset)));
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(dataset) => {
                        self.install_dataset(dataset);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.control_panel.failed = true;
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn install_dataset(&mut self, dataset: Arc<EnrichedDataset>) {
        self.control_panel.record_count = dataset.len();
        self.control_panel.dropped_unmapped = dataset.dropped_unmapped;

        let Some(range) = dataset.year_range() else {
            self.control_panel
                .set_progress(100.0, "Loaded, but no record could be mapped to a region");
            self.dataset = Some(dataset);
            return;
        };

        self.control_panel.set_year_range(range);
        let sample = dataset
            .sample(self.config.sample_size, self.config.sample_seed)
            .into_iter()
            .cloned()
            .collect();
        self.chart_viewer.set_sample(sample);
        self.control_panel
            .set_progress(100.0, &format!("Complete! {} records", dataset.len()));
        self.dataset = Some(dataset);
        self.refresh_year();
    }

    /// Recompute the views for the slider's year.
    fn refresh_year(&mut self) {
        let Some(dataset) = &self.dataset else {
            return;
        };
        let selection = dataset.filter_by_year(self.control_panel.year);
        self.chart_viewer.set_charts(YearCharts::from_selection(&selection));
    }

    /// Render the current year's charts into a user-picked folder.
    fn handle_export_png(&mut self) {
        let Some(charts) = self.chart_viewer.charts.clone() else {
            self.control_panel.set_progress(0.0, "No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return; // User cancelled
        };

        self.control_panel.set_progress(50.0, "Rendering charts...");
        match StaticChartRenderer::export_year(&charts, &dir, EXPORT_WIDTH, EXPORT_HEIGHT) {
            Ok(paths) => {
                info!("exported {} charts for {}", paths.len(), charts.year);
                self.control_panel.set_progress(
                    100.0,
                    &format!("Exported {} charts for {}", paths.len(), charts.year),
                );
                if let Err(e) = open::that(&dir) {
                    warn!("could not open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                self.control_panel
                    .set_progress(0.0, &format!("Export error: {}", e));
            }
        }
    }
}

impl<F: SourceFetcher + 'static> eframe::App for ExplorerApp<F> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::YearChanged => self.refresh_year(),
                        ControlPanelAction::ExportPng => self.handle_export_png(),
                        ControlPanelAction::Reload => self.start_loading(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ctx, ui);
        });
    }
}
