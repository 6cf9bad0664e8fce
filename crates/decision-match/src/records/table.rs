use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::RecordsError;

/// A rectangular table of text cells, the on-disk shape of every interim CSV.
///
/// Rows built from flattened JSON can carry different keys; the header is the
/// union of keys in first-appearance order and absent cells are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl FlatTable {
    /// Build a table whose first column is `id_column`, one row per keyed record.
    pub fn from_records<I>(id_column: &str, records: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<(String, String)>)>,
    {
        let mut headers = vec![id_column.to_string()];
        let mut positions: HashMap<String, usize> = HashMap::from([(id_column.to_string(), 0)]);
        let mut sparse_rows = Vec::new();

        for (id, columns) in records {
            let mut row = vec![(0, id)];
            for (column, value) in columns {
                let next = headers.len();
                let position = *positions.entry(column.clone()).or_insert_with(|| {
                    headers.push(column);
                    next
                });
                row.push((position, value));
            }
            sparse_rows.push(row);
        }

        let width = headers.len();
        let rows = sparse_rows
            .into_iter()
            .map(|cells| {
                let mut row = vec![String::new(); width];
                for (position, value) in cells {
                    row[position] = value;
                }
                row
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Cells of `name`, or `None` when the column does not exist.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[index].as_str()))
    }

    /// Columns holding free text: at least one non-empty cell that is not a number.
    pub fn textual_columns(&self) -> Vec<usize> {
        (0..self.headers.len())
            .filter(|&index| {
                self.rows.iter().any(|row| {
                    let cell = row[index].trim();
                    !cell.is_empty() && cell.parse::<f64>().is_err()
                })
            })
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), RecordsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| RecordsError::io(path, source))?;
        }
        let mut writer = csv::Writer::from_path(path).map_err(|source| RecordsError::csv(path, source))?;
        writer
            .write_record(&self.headers)
            .map_err(|source| RecordsError::csv(path, source))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|source| RecordsError::csv(path, source))?;
        }
        writer.flush().map_err(|source| RecordsError::io(path, source))?;
        Ok(())
    }

    /// Read a CSV written by [`FlatTable::write_csv`] or any tool producing a header row.
    pub fn read_csv(path: &Path) -> Result<Self, RecordsError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| RecordsError::csv(path, source))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| RecordsError::csv(path, source))?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| RecordsError::csv(path, source))?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatTable {
        FlatTable::from_records(
            "vaga_code",
            vec![
                (
                    "10".to_string(),
                    vec![
                        ("titulo".to_string(), "Dev Rust".to_string()),
                        ("salario".to_string(), "1000".to_string()),
                    ],
                ),
                (
                    "11".to_string(),
                    vec![("local".to_string(), "SP".to_string())],
                ),
            ],
        )
    }

    #[test]
    fn header_is_union_in_first_appearance_order() {
        let table = sample();
        assert_eq!(table.headers(), ["vaga_code", "titulo", "salario", "local"]);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows[1], ["11", "", "", "SP"]);
    }

    #[test]
    fn numeric_columns_are_not_textual() {
        let table = sample();
        let textual: Vec<_> = table
            .textual_columns()
            .into_iter()
            .map(|index| table.headers()[index].as_str())
            .collect();
        assert_eq!(textual, vec!["titulo", "local"]);
    }

    #[test]
    fn csv_survives_a_trip_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("interim").join("jobs.csv");
        let table = sample();
        table.write_csv(&path).expect("write");
        assert_eq!(FlatTable::read_csv(&path).expect("read"), table);
    }

    #[test]
    fn short_rows_are_padded_on_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ragged.csv");
        std::fs::write(&path, "a,b,c\n1,2\n").expect("write");
        let table = FlatTable::read_csv(&path).expect("read");
        let cells: Vec<_> = table.column("c").expect("column").collect();
        assert_eq!(cells, vec![""]);
    }
}
