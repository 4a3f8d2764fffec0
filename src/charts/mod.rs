//! Charts module - interactive and static chart rendering

mod plotter;
mod renderer;

pub use plotter::{format_cell, ChartPlotter, YearCharts};
pub use renderer::{RenderError, StaticChartRenderer};
