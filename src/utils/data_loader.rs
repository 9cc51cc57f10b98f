//! Data loading utilities

use crate::error::{ClassifierError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::Cursor;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Cell contents read as missing values
pub const NULL_MARKERS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Loader for comma-delimited files with a header row
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned for dtype inference, `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
        }
    }

    pub fn with_infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    fn options(&self) -> CsvReadOptions {
        let null_values = NULL_MARKERS
            .iter()
            .map(|&m| PlSmallStr::from_static(m))
            .collect();
        let parse_opts = CsvParseOptions::default()
            .with_null_values(Some(NullValues::AllColumns(null_values)));

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
    }

    /// Load a CSV file from disk
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let start = Instant::now();
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(ClassifierError::DataError("empty CSV content".to_string()));
        }

        let df = self.options().into_reader_with_file_handle(file).finish()?;
        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded CSV file"
        );
        Ok(df)
    }

    /// Parse CSV content held in memory
    pub fn load_csv_bytes(&self, bytes: &[u8]) -> Result<DataFrame> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Err(ClassifierError::DataError("empty CSV content".to_string()));
        }

        let df = self
            .options()
            .into_reader_with_file_handle(Cursor::new(bytes))
            .finish()?;
        Ok(df)
    }
}

/// Column name and dtype pairs in frame order
pub fn describe_columns(df: &DataFrame) -> Vec<(String, String)> {
    df.get_columns()
        .iter()
        .map(|c| (c.name().to_string(), c.dtype().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_csv_bytes() {
        let csv = b"A,B,C\n1,2.5,x\n3,4.0,y\n";
        let df = DataLoader::new().load_csv_bytes(csv).unwrap();
        let names: Vec<String> = describe_columns(&df).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = DataLoader::new().load_csv_bytes(b"  \n").unwrap_err();
        assert!(matches!(err, ClassifierError::DataError(_)));
    }

    #[test]
    fn test_missing_cells_become_nulls() {
        let csv = b"a,b\n1,\n2,5\n,6\n";
        let df = DataLoader::new().load_csv_bytes(csv).unwrap();
        assert_eq!(df.column("a").unwrap().null_count(), 1);
        assert_eq!(df.column("b").unwrap().null_count(), 1);
    }

    #[test]
    fn test_null_markers_keep_column_numeric() {
        let csv = b"a,b\n1.0,x\nNA,y\nnan,z\nnull,w\n5.0,v\n";
        let df = DataLoader::new().load_csv_bytes(csv).unwrap();
        let a = df.column("a").unwrap();
        assert_eq!(a.dtype(), &DataType::Float64);
        assert_eq!(a.null_count(), 3);
    }

    #[test]
    fn test_load_csv_file() {
        let path = std::env::temp_dir().join(format!(
            "downtime_loader_{}.csv",
            std::process::id()
        ));
        {
            let mut f = File::create(&path).unwrap();
            writeln!(f, "speed,label").unwrap();
            writeln!(f, "1.0,Yes").unwrap();
        }
        let df = DataLoader::new().load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let described = describe_columns(&df);
        assert_eq!(described[0].0, "speed");
        assert_eq!(described[1].0, "label");
    }
}
