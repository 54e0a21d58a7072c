//! Code for reading a price index from a CSV file.
use super::{input_err_msg, is_sorted_and_unique, read_csv};
use crate::inflation::InflationIndex;
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

/// The name of the price index file in a study directory
pub const CPI_FILE_NAME: &str = "cpi.csv";

#[derive(Debug, PartialEq, Deserialize)]
struct IndexRow {
    year: u32,
    index: f64,
}

/// Read the price index from a study directory, if the file is present
pub fn read_inflation_index(study_dir: &Path) -> Result<Option<InflationIndex>> {
    let file_path = study_dir.join(CPI_FILE_NAME);
    if !file_path.is_file() {
        return Ok(None);
    }

    let iter = read_csv::<IndexRow>(&file_path)?;
    let index = read_index_from_iter(iter).with_context(|| input_err_msg(&file_path))?;

    Ok(Some(index))
}

fn read_index_from_iter<I>(iter: I) -> Result<InflationIndex>
where
    I: Iterator<Item = IndexRow>,
{
    let rows = iter.collect_vec();
    ensure!(
        is_sorted_and_unique(rows.iter().map(|row| row.year)),
        "Years must be unique and in order"
    );
    for row in &rows {
        ensure!(
            row.index.is_finite() && row.index > 0.0,
            "Index for year {} must be a positive number",
            row.year
        );
    }

    Ok(rows.into_iter().map(|row| (row.year, row.index)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_inflation_index() {
        let dir = tempdir().unwrap();
        assert!(read_inflation_index(dir.path()).unwrap().is_none());

        {
            let mut file = File::create(dir.path().join(CPI_FILE_NAME)).unwrap();
            writeln!(file, "year,index\n2010,0.92\n2015,1.0\n2020,1.09").unwrap();
        }
        let index = read_inflation_index(dir.path()).unwrap().unwrap();
        assert_approx_eq!(f64, index.adjust(1.0, 2015, 2020).unwrap(), 1.09);
    }

    #[test]
    fn test_read_index_unordered() {
        let rows = [
            IndexRow {
                year: 2015,
                index: 1.0,
            },
            IndexRow {
                year: 2010,
                index: 0.9,
            },
        ];
        assert_error!(
            read_index_from_iter(rows.into_iter()),
            "Years must be unique and in order"
        );
    }

    #[test]
    fn test_read_index_non_positive() {
        let rows = [IndexRow {
            year: 2015,
            index: 0.0,
        }];
        assert_error!(
            read_index_from_iter(rows.into_iter()),
            "Index for year 2015 must be a positive number"
        );
    }
}
