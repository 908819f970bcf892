//! In-memory view of an uploaded CSV: a header row plus string cells.
//! Parsing is deliberately forgiving (ragged rows are padded, blank lines
//! skipped); strictness only appears when a column is read as numbers.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::DeckError;

pub struct DataTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl DataTable {
    /// Load a CSV file. The first line is the header; every following
    /// non-empty line is a data row padded or truncated to the header width.
    pub fn load_csv(path: &Path) -> Result<Self, DeckError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let header_line = match lines.next() {
            Some(line) => line?,
            None => return Err(DeckError::Table("file is empty".to_string())),
        };
        let headers = parse_row(&header_line);
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(DeckError::Table("header row is empty".to_string()));
        }
        let width = headers.len();

        let mut rows = Vec::new();
        for line in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut cells = parse_row(&line);
            cells.resize(width, String::new());
            rows.push(cells);
        }

        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Read one column as numbers. Blank cells are skipped; anything else
    /// that does not parse is an error naming the column.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>, DeckError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| DeckError::Table(format!("no column named '{name}'")))?;
        let mut values = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let cell = row[idx].trim();
            if cell.is_empty() {
                continue;
            }
            let v = parse_number(cell)
                .ok_or_else(|| DeckError::Table(format!("column '{name}' is not numeric")))?;
            values.push(v);
        }
        if values.is_empty() {
            return Err(DeckError::Table(format!("column '{name}' has no values")));
        }
        Ok(values)
    }

    /// Read two columns as paired numbers, skipping rows where either cell
    /// is blank. Lengths therefore always match.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>, DeckError> {
        let xi = self
            .column_index(x)
            .ok_or_else(|| DeckError::Table(format!("no column named '{x}'")))?;
        let yi = self
            .column_index(y)
            .ok_or_else(|| DeckError::Table(format!("no column named '{y}'")))?;
        let mut pairs = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let (xc, yc) = (row[xi].trim(), row[yi].trim());
            if xc.is_empty() || yc.is_empty() {
                continue;
            }
            let xv = parse_number(xc)
                .ok_or_else(|| DeckError::Table(format!("column '{x}' is not numeric")))?;
            let yv = parse_number(yc)
                .ok_or_else(|| DeckError::Table(format!("column '{y}' is not numeric")))?;
            pairs.push((xv, yv));
        }
        if pairs.is_empty() {
            return Err(DeckError::Table(format!(
                "columns '{x}' and '{y}' have no paired values"
            )));
        }
        Ok(pairs)
    }
}

/// Only finite numbers are usable for plotting; "NaN" parses as f64 but
/// would poison axis bounds.
fn parse_number(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split one CSV line into cells. Double quotes wrap cells containing
/// commas; a doubled quote inside a quoted cell is a literal quote.
fn parse_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table_from(contents: &str) -> Result<DataTable, DeckError> {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        DataTable::load_csv(file.path())
    }

    #[test]
    fn parses_quoted_cells_and_escaped_quotes() {
        let cells = parse_row(r#"plain,"has, comma","say ""hi""""#);
        assert_eq!(cells, vec!["plain", "has, comma", r#"say "hi""#]);
    }

    #[test]
    fn pads_ragged_rows_to_header_width() {
        let table = table_from("a,b,c\n1,2\n4,5,6,7\n").expect("load");
        assert_eq!(table.headers(), &["a", "b", "c"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.numeric_column("c").expect("col c"), vec![6.0]);
    }

    #[test]
    fn numeric_pairs_skips_blank_rows() {
        let table = table_from("x,y\n1,10\n2,\n3,30\n").expect("load");
        let pairs = table.numeric_pairs("x", "y").expect("pairs");
        assert_eq!(pairs, vec![(1.0, 10.0), (3.0, 30.0)]);
    }

    #[test]
    fn non_numeric_column_is_an_error() {
        let table = table_from("x,label\n1,apple\n2,pear\n").expect("load");
        let err = table.numeric_column("label").unwrap_err();
        assert!(matches!(err, DeckError::Table(_)));
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn missing_column_is_an_error() {
        let table = table_from("x,y\n1,2\n").expect("load");
        assert!(table.numeric_column("z").is_err());
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(table_from("").is_err());
    }
}
