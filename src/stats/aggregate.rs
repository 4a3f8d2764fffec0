//! Region Aggregation Module
//! Sums a per-capita metric over all countries of each world region.

use crate::data::{EmptyResultWarning, EnrichedRecord};
use std::collections::BTreeMap;
use std::fmt;

/// Per-capita quantity that can be summed per region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Co2PerCapita,
    GdpPerCapita,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::Co2PerCapita, Metric::GdpPerCapita];

    /// The metric's value on a record; `None` when the source lacks it.
    pub fn value(self, record: &EnrichedRecord) -> Option<f64> {
        match self {
            Metric::Co2PerCapita => record.record.co2_per_capita,
            Metric::GdpPerCapita => record.record.gdp_per_capita,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Metric::Co2PerCapita => "co2_per_capita",
            Metric::GdpPerCapita => "gdp_per_capita",
        }
    }

    /// Axis label used by the charts.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Co2PerCapita => "CO2 emissions per capita (t)",
            Metric::GdpPerCapita => "GDP per capita (international-$ at 2011 prices)",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One total per region, keyed by region name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionTotals {
    pub metric: Option<Metric>,
    pub totals: BTreeMap<String, f64>,
    /// Records that went into the totals.
    pub record_count: usize,
}

impl RegionTotals {
    pub fn get(&self, region: &str) -> Option<f64> {
        self.totals.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Set when no record was aggregated; the bar views show a placeholder instead.
    pub fn empty_warning(&self, year: i32) -> Option<EmptyResultWarning> {
        (self.record_count == 0).then_some(EmptyResultWarning { year })
    }

    /// Sum across all regions.
    pub fn grand_total(&self) -> f64 {
        self.totals.values().sum()
    }

    /// Regions ordered by ascending total, for ranked bar display.
    ///
    /// The sort is stable, so equal totals stay in region-name order.
    pub fn ranked_ascending(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self
            .totals
            .iter()
            .map(|(region, total)| (region.as_str(), *total))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked
    }
}

/// Group `records` by region and sum `metric` within each group.
///
/// Undefined values contribute nothing; a region whose values are all
/// undefined still appears with a total of zero.
pub fn aggregate_by_region<'a, I>(records: I, metric: Metric) -> RegionTotals
where
    I: IntoIterator<Item = &'a EnrichedRecord>,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut record_count = 0;
    for record in records {
        record_count += 1;
        let entry = totals.entry(record.region.clone()).or_insert(0.0);
        if let Some(v) = metric.value(record) {
            *entry += v;
        }
    }

    RegionTotals {
        metric: Some(metric),
        totals,
        record_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CountryYearRecord, DataProcessor, RegionMapping};

    fn emissions() -> Vec<CountryYearRecord> {
        let rows = [
            ("A", "AAA", 2000, Some(1000.0), Some(500000.0), Some(0.1)),
            ("B", "BBB", 2000, Some(10.0), Some(2000.0), Some(2.0)),
            ("C", "CCC", 2000, Some(0.0), Some(1.0), Some(0.25)),
            ("D", "DDD", 2000, Some(4.0), Some(100.0), None),
            ("A", "AAA", 2001, Some(1000.0), Some(600000.0), Some(0.2)),
        ];
        rows.iter()
            .map(|&(country, iso, year, population, gdp, co2_per_capita)| CountryYearRecord {
                country: country.to_string(),
                iso_code: Some(iso.to_string()),
                year,
                population,
                co2: None,
                gdp,
                co2_per_capita,
                gdp_per_capita: None,
            })
            .collect()
    }

    fn regions() -> Vec<RegionMapping> {
        [("AAA", "X"), ("BBB", "Y"), ("CCC", "Y"), ("DDD", "Z")]
            .iter()
            .map(|&(iso, region)| RegionMapping {
                iso_code: iso.to_string(),
                region: region.to_string(),
            })
            .collect()
    }

    #[test]
    fn worked_example_co2_total() {
        let dataset = DataProcessor::prepare(&emissions()[..1], &regions());
        let totals = aggregate_by_region(dataset.filter_by_year(2000).records, Metric::Co2PerCapita);
        assert_eq!(totals.totals, BTreeMap::from([("X".to_string(), 0.1)]));
    }

    #[test]
    fn sums_within_each_region() {
        let dataset = DataProcessor::prepare(&emissions(), &regions());
        let year = dataset.filter_by_year(2000);

        let co2 = aggregate_by_region(year.records.iter().copied(), Metric::Co2PerCapita);
        assert_eq!(co2.record_count, 4);
        assert_eq!(co2.empty_warning(2000), None);
        assert_eq!(co2.get("X"), Some(0.1));
        assert_eq!(co2.get("Y"), Some(2.25));
        assert_eq!(co2.get("Z"), Some(0.0));

        let gdp = aggregate_by_region(year.records.iter().copied(), Metric::GdpPerCapita);
        assert_eq!(gdp.get("X"), Some(500.0));
        // C has zero population, so only B contributes
        assert_eq!(gdp.get("Y"), Some(200.0));
        assert_eq!(gdp.get("Z"), Some(25.0));
    }

    #[test]
    fn region_totals_add_up_to_the_year_total() {
        let dataset = DataProcessor::prepare(&emissions(), &regions());
        let year = dataset.filter_by_year(2000);
        for metric in Metric::ALL {
            let totals = aggregate_by_region(year.records.iter().copied(), metric);
            let direct: f64 = year.records.iter().filter_map(|r| metric.value(r)).sum();
            assert!((totals.grand_total() - direct).abs() < 1e-9, "{metric}");
        }
    }

    #[test]
    fn ranking_is_ascending_and_stable_on_ties() {
        let totals = RegionTotals {
            metric: None,
            record_count: 3,
            totals: BTreeMap::from([
                ("Beta".to_string(), 3.0),
                ("Alpha".to_string(), 3.0),
                ("Gamma".to_string(), 1.0),
            ]),
        };
        assert_eq!(
            totals.ranked_ascending(),
            vec![("Gamma", 1.0), ("Alpha", 3.0), ("Beta", 3.0)]
        );
    }

    #[test]
    fn empty_input_gives_empty_totals() {
        let totals = aggregate_by_region(std::iter::empty(), Metric::GdpPerCapita);
        assert!(totals.is_empty());
        assert_eq!(totals.grand_total(), 0.0);
        assert_eq!(totals.empty_warning(1850), Some(EmptyResultWarning { year: 1850 }));
    }
}
