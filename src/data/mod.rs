//! Data module - remote CSV loading and the transform pipeline

mod loader;
mod processor;
mod schema;

pub use loader::{parse_csv, DataLoader, FetchError, HttpFetcher, LoaderError, SourceFetcher, Sources};
pub use processor::{
    DataProcessor, EmptyResultWarning, EnrichedDataset, JoinedRecord, YearSelection,
};
pub use schema::{
    columns, emissions_from_frame, regions_from_frame, CountryYearRecord, EnrichedRecord,
    RegionMapping, SchemaError,
};
