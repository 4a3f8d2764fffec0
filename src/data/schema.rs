//! Typed Records
//! Record types for both source tables and their construction from Polars frames.
//!
//! Every column the pipeline needs is looked up by name and cast to its
//! expected type, so a changed source layout fails here as a `SchemaError`
//! instead of surfacing later as silently missing values.

use polars::prelude::*;
use thiserror::Error;

/// Source column names.
pub mod columns {
    pub const COUNTRY: &str = "country";
    pub const ISO_CODE: &str = "iso_code";
    pub const YEAR: &str = "year";
    pub const POPULATION: &str = "population";
    pub const GDP: &str = "gdp";
    pub const CO2: &str = "co2";
    pub const CO2_PER_CAPITA: &str = "co2_per_capita";

    pub const REGION_CODE: &str = "Code";
    pub const REGION_NAME: &str = "World Region according to the World Bank";
}

pub const EMISSIONS_TABLE: &str = "emissions";
pub const REGIONS_TABLE: &str = "regions";

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Column `{column}` missing from {table} table")]
    MissingColumn { table: &'static str, column: String },
    #[error("Column `{column}` in {table} table is not {expected}: {source}")]
    Mistyped {
        table: &'static str,
        column: String,
        expected: &'static str,
        #[source]
        source: PolarsError,
    },
    #[error("Column `{column}` in {table} table has no value at row {row}")]
    MissingValue {
        table: &'static str,
        column: String,
        row: usize,
    },
    #[error("Year {value} at row {row} is out of range")]
    YearOutOfRange { value: i64, row: usize },
}

/// One country in one year.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryYearRecord {
    pub country: String,
    /// `None` for aggregate rows such as "World", which never map to a region.
    pub iso_code: Option<String>,
    pub year: i32,
    pub population: Option<f64>,
    pub co2: Option<f64>,
    pub gdp: Option<f64>,
    pub co2_per_capita: Option<f64>,
    /// Filled in by the pipeline; always `None` straight out of the loader.
    pub gdp_per_capita: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionMapping {
    pub iso_code: String,
    pub region: String,
}

/// A country-year record attributed to its world region.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: CountryYearRecord,
    pub region: String,
}

impl EnrichedRecord {
    pub fn year(&self) -> i32 {
        self.record.year
    }
}

/// Build emissions records from a parsed frame.
pub fn emissions_from_frame(df: &DataFrame) -> Result<Vec<CountryYearRecord>, SchemaError> {
    let t = EMISSIONS_TABLE;
    let countries = str_column(df, t, columns::COUNTRY)?;
    let iso_codes = str_column(df, t, columns::ISO_CODE)?;
    let years = i64_column(df, t, columns::YEAR)?;
    let population = f64_column(df, t, columns::POPULATION)?;
    let co2 = f64_column(df, t, columns::CO2)?;
    let gdp = f64_column(df, t, columns::GDP)?;
    let co2_per_capita = f64_column(df, t, columns::CO2_PER_CAPITA)?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let country = countries[row].clone().ok_or_else(|| SchemaError::MissingValue {
            table: t,
            column: columns::COUNTRY.to_string(),
            row,
        })?;
        let year = years[row].ok_or_else(|| SchemaError::MissingValue {
            table: t,
            column: columns::YEAR.to_string(),
            row,
        })?;
        let year =
            i32::try_from(year).map_err(|_| SchemaError::YearOutOfRange { value: year, row })?;

        records.push(CountryYearRecord {
            country,
            iso_code: iso_codes[row].clone().filter(|code| !code.is_empty()),
            year,
            population: population[row],
            co2: co2[row],
            gdp: gdp[row],
            co2_per_capita: co2_per_capita[row],
            gdp_per_capita: None,
        });
    }

    Ok(records)
}

/// Build region mappings from a parsed frame.
///
/// Rows without a code or with a blank region carry no attribution and are skipped.
pub fn regions_from_frame(df: &DataFrame) -> Result<Vec<RegionMapping>, SchemaError> {
    let codes = str_column(df, REGIONS_TABLE, columns::REGION_CODE)?;
    let regions = str_column(df, REGIONS_TABLE, columns::REGION_NAME)?;

    Ok(codes
        .into_iter()
        .zip(regions)
        .filter_map(|(code, region)| match (code, region) {
            (Some(iso_code), Some(region)) if !iso_code.is_empty() && !region.trim().is_empty() => {
                Some(RegionMapping { iso_code, region })
            }
            _ => None,
        })
        .collect())
}

fn series<'a>(df: &'a DataFrame, table: &'static str, name: &str) -> Result<&'a Series, SchemaError> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| SchemaError::MissingColumn {
            table,
            column: name.to_string(),
        })
}

fn cast(
    df: &DataFrame,
    table: &'static str,
    name: &str,
    dtype: &DataType,
    expected: &'static str,
) -> Result<Series, SchemaError> {
    series(df, table, name)?
        .strict_cast(dtype)
        .map_err(|source| SchemaError::Mistyped {
            table,
            column: name.to_string(),
            expected,
            source,
        })
}

fn f64_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<f64>>, SchemaError> {
    let s = cast(df, table, name, &DataType::Float64, "numeric")?;
    let ca = s.f64().map_err(|source| SchemaError::Mistyped {
        table,
        column: name.to_string(),
        expected: "numeric",
        source,
    })?;
    Ok(ca.into_iter().collect())
}

fn i64_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<i64>>, SchemaError> {
    let s = cast(df, table, name, &DataType::Int64, "an integer")?;
    let ca = s.i64().map_err(|source| SchemaError::Mistyped {
        table,
        column: name.to_string(),
        expected: "an integer",
        source,
    })?;
    Ok(ca.into_iter().collect())
}

fn str_column(df: &DataFrame, table: &'static str, name: &str) -> Result<Vec<Option<String>>, SchemaError> {
    let s = cast(df, table, name, &DataType::String, "text")?;
    let ca = s.str().map_err(|source| SchemaError::Mistyped {
        table,
        column: name.to_string(),
        expected: "text",
        source,
    })?;
    Ok(ca.into_iter().map(|v| v.map(str::to_string)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emissions_df() -> DataFrame {
        df!(
            "country" => &["Aland", "World"],
            "iso_code" => &[Some("AAA"), None],
            "year" => &[2000i64, 2000],
            "population" => &[Some(1000.0), Some(6.0e9)],
            "gdp" => &[Some(500000.0), None],
            "co2" => &[Some(100.0), Some(2.5e4)],
            "co2_per_capita" => &[Some(0.1), Some(4.1)]
        )
        .unwrap()
    }

    #[test]
    fn builds_typed_emissions_records() {
        let records = emissions_from_frame(&emissions_df()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].iso_code.as_deref(), Some("AAA"));
        assert_eq!(records[0].year, 2000);
        assert_eq!(records[0].gdp, Some(500000.0));
        assert_eq!(records[0].gdp_per_capita, None);
        assert_eq!(records[1].iso_code, None);
        assert_eq!(records[1].gdp, None);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let df = emissions_df().drop("co2_per_capita").unwrap();
        match emissions_from_frame(&df) {
            Err(SchemaError::MissingColumn { column, table }) => {
                assert_eq!(column, "co2_per_capita");
                assert_eq!(table, EMISSIONS_TABLE);
            }
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn non_integer_year_is_mistyped() {
        let mut df = emissions_df();
        df.replace("year", Series::new("year".into(), &["2000", "two thousand"]))
            .unwrap();
        assert!(matches!(
            emissions_from_frame(&df),
            Err(SchemaError::Mistyped { .. })
        ));
    }

    #[test]
    fn region_rows_without_code_or_label_are_skipped() {
        let df = df!(
            "Entity" => &["Aland", "Nowhere", "Blank"],
            "Code" => &[Some("AAA"), None, Some("BBB")],
            "World Region according to the World Bank" => &[Some("X"), Some("Y"), Some("  ")]
        )
        .unwrap();
        let regions = regions_from_frame(&df).unwrap();
        assert_eq!(
            regions,
            vec![RegionMapping {
                iso_code: "AAA".to_string(),
                region: "X".to_string()
            }]
        );
    }
}
