//! Remote CSV Data Loader Module
//! Fetches both source tables over HTTP, parses them with Polars and keeps
//! the typed result for the rest of the session.

use super::schema::{self, CountryYearRecord, RegionMapping, SchemaError};
use crate::config::AppConfig;
use once_cell::sync::OnceCell;
use polars::prelude::*;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

/// Both tables are published with `;` as field separator.
const SEPARATOR: u8 = b';';

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Malformed CSV from {url}: {source}")]
    Csv {
        url: String,
        #[source]
        source: PolarsError,
    },
    #[error("Source {url} unavailable: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Unexpected layout of {url}: {source}")]
    Schema {
        url: String,
        #[source]
        source: SchemaError,
    },
}

/// Raw access to a source location.
pub trait SourceFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Blocking HTTP GET, no authentication.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl SourceFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let http = |source| FetchError::Http {
            url: url.to_string(),
            source,
        };
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(http)?;
        Ok(bytes.to_vec())
    }
}

/// Where the two tables live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub emissions_url: String,
    pub regions_url: String,
}

impl From<&AppConfig> for Sources {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            emissions_url: cfg.emissions_url.clone(),
            regions_url: cfg.regions_url.clone(),
        }
    }
}

/// Session-scoped loader. Each table is fetched at most once per instance;
/// failures are not cached, so a later call fetches again.
pub struct DataLoader<F = HttpFetcher> {
    fetcher: F,
    sources: Sources,
    emissions: OnceCell<Arc<[CountryYearRecord]>>,
    regions: OnceCell<Arc<[RegionMapping]>>,
}

impl DataLoader<HttpFetcher> {
    pub fn from_config(cfg: &AppConfig) -> Result<Self, LoaderError> {
        let fetcher = HttpFetcher::new(cfg.http_timeout())?;
        Ok(Self::new(fetcher, Sources::from(cfg)))
    }
}

impl<F: SourceFetcher> DataLoader<F> {
    pub fn new(fetcher: F, sources: Sources) -> Self {
        Self {
            fetcher,
            sources,
            emissions: OnceCell::new(),
            regions: OnceCell::new(),
        }
    }

    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Per-country, per-year emissions and GDP.
    pub fn load_emissions(&self) -> Result<Arc<[CountryYearRecord]>, LoaderError> {
        self.emissions
            .get_or_try_init(|| -> Result<_, LoaderError> {
                let url = &self.sources.emissions_url;
                let df = self.fetch_frame(url)?;
                let records = schema::emissions_from_frame(&df).map_err(|source| {
                    LoaderError::Schema {
                        url: url.clone(),
                        source,
                    }
                })?;
                info!("loaded {} emissions records", records.len());
                Ok(records.into())
            })
            .cloned()
    }

    /// Country code → world region.
    pub fn load_regions(&self) -> Result<Arc<[RegionMapping]>, LoaderError> {
        self.regions
            .get_or_try_init(|| -> Result<_, LoaderError> {
                let url = &self.sources.regions_url;
                let df = self.fetch_frame(url)?;
                let regions = schema::regions_from_frame(&df).map_err(|source| {
                    LoaderError::Schema {
                        url: url.clone(),
                        source,
                    }
                })?;
                info!("loaded {} region mappings", regions.len());
                Ok(regions.into())
            })
            .cloned()
    }

    /// Fetch both tables concurrently and wait for both.
    #[allow(clippy::type_complexity)]
    pub fn load_all(
        &self,
    ) -> Result<(Arc<[CountryYearRecord]>, Arc<[RegionMapping]>), LoaderError> {
        let (emissions, regions) = rayon::join(|| self.load_emissions(), || self.load_regions());
        Ok((emissions?, regions?))
    }

    fn fetch_frame(&self, url: &str) -> Result<DataFrame, FetchError> {
        let start = Instant::now();
        let bytes = self.fetcher.fetch(url)?;
        debug!(
            "fetched {} bytes from {} in {:.3}s",
            bytes.len(),
            url,
            start.elapsed().as_secs_f64()
        );
        parse_csv(url, bytes)
    }
}

/// Parse a `;`-separated payload with a header row.
pub fn parse_csv(url: &str, bytes: Vec<u8>) -> Result<DataFrame, FetchError> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_separator(SEPARATOR))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|source| FetchError::Csv {
            url: url.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const EMISSIONS: &str = "country;iso_code;year;population;gdp;co2;co2_per_capita;methane\n\
                             A;AAA;2000;1000;500000;100;0.1;3\n\
                             World;;2000;6000000000;;25000;4.1;9\n";
    const REGIONS: &str = "Entity;Code;World Region according to the World Bank\n\
                           A;AAA;X\n";

    #[derive(Default)]
    struct MemoryFetcher {
        payloads: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl SourceFetcher for MemoryFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.payloads
                .get(url)
                .map(|p| p.as_bytes().to_vec())
                .ok_or_else(|| FetchError::Unavailable {
                    url: url.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn sources() -> Sources {
        Sources {
            emissions_url: "mem://emissions".to_string(),
            regions_url: "mem://regions".to_string(),
        }
    }

    fn loader(payloads: &[(&str, &str)]) -> DataLoader<MemoryFetcher> {
        let fetcher = MemoryFetcher {
            payloads: payloads
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        };
        DataLoader::new(fetcher, sources())
    }

    #[test]
    fn parses_semicolon_tables() {
        let loader = loader(&[("mem://emissions", EMISSIONS), ("mem://regions", REGIONS)]);
        let (emissions, regions) = loader.load_all().unwrap();
        assert_eq!(emissions.len(), 2);
        assert_eq!(emissions[0].country, "A");
        assert_eq!(emissions[0].co2_per_capita, Some(0.1));
        assert_eq!(emissions[1].iso_code, None);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].region, "X");
    }

    #[test]
    fn repeated_loads_hit_the_cache() {
        let loader = loader(&[("mem://emissions", EMISSIONS), ("mem://regions", REGIONS)]);
        let first = loader.load_emissions().unwrap();
        let second = loader.load_emissions().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failures_are_not_cached() {
        let loader = loader(&[("mem://regions", REGIONS)]);
        assert!(matches!(
            loader.load_emissions(),
            Err(LoaderError::Fetch(FetchError::Unavailable { .. }))
        ));
        assert!(loader.load_emissions().is_err());
        assert_eq!(loader.fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_region_column_is_reported_as_schema_error() {
        let loader = loader(&[("mem://regions", "Entity;Code\nA;AAA\n")]);
        match loader.load_regions() {
            Err(LoaderError::Schema { url, source }) => {
                assert_eq!(url, "mem://regions");
                assert!(matches!(source, SchemaError::MissingColumn { .. }));
            }
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    fn assert_csv_error(payload: &str) {
        let loader = loader(&[("mem://emissions", payload)]);
        match loader.load_emissions() {
            Err(LoaderError::Fetch(FetchError::Csv { url, .. })) => assert_eq!(url, "mem://emissions"),
            other => panic!("expected CSV error for {payload:?}, got {other:?}"),
        }
    }

    #[test]
    fn malformed_payloads_are_csv_errors() {
        assert_csv_error("");
        assert_csv_error("country;iso_code\nA;AAA;extra;more\n");
        assert_csv_error("country;iso_code\n\"A;AAA\n");
    }

    #[test]
    fn html_error_page_fails_on_missing_columns() {
        let loader = loader(&[("mem://emissions", "<html><body>Not Found</body></html>\n")]);
        assert!(matches!(
            loader.load_emissions(),
            Err(LoaderError::Schema {
                source: SchemaError::MissingColumn { .. },
                ..
            })
        ));
    }
}
