//! Data Processor Module
//! Derives per-capita GDP, attaches world regions and slices the result by year.

use super::schema::{CountryYearRecord, EnrichedRecord, RegionMapping};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::fmt;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

/// A country-year record after the region join, before unmapped rows are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub record: CountryYearRecord,
    pub region: Option<String>,
}

/// The working dataset: every record attributed to a region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichedDataset {
    pub records: Vec<EnrichedRecord>,
    /// Records discarded because their country code has no region.
    pub dropped_unmapped: usize,
}

impl EnrichedDataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest year present, or `None` for an empty dataset.
    pub fn year_range(&self) -> Option<RangeInclusive<i32>> {
        let min = self.records.iter().map(EnrichedRecord::year).min()?;
        let max = self.records.iter().map(EnrichedRecord::year).max()?;
        Some(min..=max)
    }

    /// Distinct years in ascending order.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(EnrichedRecord::year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// All records of one year.
    pub fn filter_by_year(&self, year: i32) -> YearSelection<'_> {
        DataProcessor::filter_by_year(&self.records, year)
    }

    /// Deterministic random sample for the overview table.
    pub fn sample(&self, n: usize, seed: u64) -> Vec<&EnrichedRecord> {
        DataProcessor::sample(&self.records, n, seed)
    }
}

/// Records of one year, borrowed from the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct YearSelection<'a> {
    pub year: i32,
    pub records: Vec<&'a EnrichedRecord>,
}

impl YearSelection<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set when nothing matched; the views show a placeholder instead.
    pub fn empty_warning(&self) -> Option<EmptyResultWarning> {
        self.is_empty()
            .then_some(EmptyResultWarning { year: self.year })
    }
}

/// Non-fatal: a year with no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyResultWarning {
    pub year: i32,
}

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No records for year {}", self.year)
    }
}

/// Handles the transformation from raw tables to the enriched dataset.
pub struct DataProcessor;

impl DataProcessor {
    /// Run derive, join and region filter over the raw tables.
    ///
    /// Pure in its inputs: calling it twice yields identical datasets.
    pub fn prepare(emissions: &[CountryYearRecord], regions: &[RegionMapping]) -> EnrichedDataset {
        let derived = Self::derive_gdp_per_capita(emissions);
        let joined = Self::join_regions(derived, regions);
        let dataset = Self::drop_unmapped(joined);

        info!(
            "prepared {} enriched records ({} without region dropped)",
            dataset.len(),
            dataset.dropped_unmapped
        );
        dataset
    }

    /// `gdp / population`, undefined unless both are present and population is positive.
    pub fn gdp_per_capita(gdp: Option<f64>, population: Option<f64>) -> Option<f64> {
        match (gdp, population) {
            (Some(gdp), Some(pop)) if pop > 0.0 => Some(gdp / pop),
            _ => None,
        }
    }

    /// Copy of the records with `gdp_per_capita` filled in.
    pub fn derive_gdp_per_capita(records: &[CountryYearRecord]) -> Vec<CountryYearRecord> {
        records
            .iter()
            .map(|r| CountryYearRecord {
                gdp_per_capita: Self::gdp_per_capita(r.gdp, r.population),
                ..r.clone()
            })
            .collect()
    }

    /// Left join on exact `iso_code`. Unmatched records keep `region: None`.
    ///
    /// The mapping is keyed by code; a repeated code keeps its first region so
    /// that no record is duplicated by the join.
    pub fn join_regions(records: Vec<CountryYearRecord>, regions: &[RegionMapping]) -> Vec<JoinedRecord> {
        let mut lookup: HashMap<&str, &str> = HashMap::with_capacity(regions.len());
        for mapping in regions {
            if let Some(existing) = lookup.get(mapping.iso_code.as_str()) {
                if *existing != mapping.region {
                    warn!(
                        "duplicate region mapping for {}: keeping {}, ignoring {}",
                        mapping.iso_code, existing, mapping.region
                    );
                }
                continue;
            }
            lookup.insert(&mapping.iso_code, &mapping.region);
        }

        records
            .into_iter()
            .map(|record| {
                let region = record
                    .iso_code
                    .as_deref()
                    .and_then(|code| lookup.get(code))
                    .map(|region| region.to_string());
                JoinedRecord { record, region }
            })
            .collect()
    }

    /// Keep only records with a region; count the rest.
    pub fn drop_unmapped(joined: Vec<JoinedRecord>) -> EnrichedDataset {
        let total = joined.len();
        let records: Vec<EnrichedRecord> = joined
            .into_iter()
            .filter_map(|j| {
                j.region
                    .filter(|region| !region.is_empty())
                    .map(|region| EnrichedRecord {
                        record: j.record,
                        region,
                    })
            })
            .collect();

        let dropped_unmapped = total - records.len();
        if dropped_unmapped > 0 {
            debug!("{} of {} records have no region mapping", dropped_unmapped, total);
        }

        EnrichedDataset {
            records,
            dropped_unmapped,
        }
    }

    /// Records whose year equals `year`, in dataset order.
    pub fn filter_by_year(records: &[EnrichedRecord], year: i32) -> YearSelection<'_> {
        let selection = YearSelection {
            year,
            records: records.iter().filter(|r| r.year() == year).collect(),
        };
        if let Some(warning) = selection.empty_warning() {
            warn!("{}", warning);
        }
        selection
    }

    /// Up to `n` distinct records, chosen by a seeded RNG and kept in dataset order.
    pub fn sample(records: &[EnrichedRecord], n: usize, seed: u64) -> Vec<&EnrichedRecord> {
        let mut rng = StdRng::seed_from_u64(seed);
        let indices: Vec<usize> = (0..records.len()).collect();
        let mut picked: Vec<usize> = indices.choose_multiple(&mut rng, n).copied().collect();
        picked.sort_unstable();
        picked.into_iter().map(|i| &records[i]).collect()
    }
}
