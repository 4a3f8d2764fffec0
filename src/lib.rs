//! CO2 Explorer - CO2 emissions and GDP per world region
//!
//! Loads the Our World in Data CO2 table and a country → region mapping,
//! joins them once per session and serves per-year views.

pub mod charts;
pub mod config;
pub mod data;
pub mod gui;
pub mod stats;
