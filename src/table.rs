use anyhow::{Context, Result, anyhow};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion: numbers pass through, text is parsed after trimming.
    /// Blank, unparsable or non-finite values give `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().parse::<f64>().ok()?,
            Cell::Empty => return None,
        };
        n.is_finite().then_some(n)
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::String(s) if s.is_empty() => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// Column-named rows of cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Renames `from` to `to`. A table without `from` is left unchanged.
    pub fn rename_column(&mut self, from: &str, to: &str) {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
    }

    /// Appends `other` row-wise, aligning columns by name. Columns only one
    /// side has are filled with `Cell::Empty` on the other.
    pub fn concat(mut self, other: Table) -> Table {
        for col in &other.columns {
            if self.column_index(col).is_none() {
                self.columns.push(col.clone());
                for row in &mut self.rows {
                    row.push(Cell::Empty);
                }
            }
        }

        let mapping: Vec<usize> = other.columns.iter()
            .filter_map(|c| self.column_index(c))
            .collect();

        for row in other.rows {
            let mut aligned = vec![Cell::Empty; self.columns.len()];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                aligned[idx] = cell;
            }
            self.rows.push(aligned);
        }

        self
    }
}

/// Makes header names unique the way pandas does: blank headers become
/// `Unnamed: <index>` and repeats get `.1`, `.2`, ... suffixes. Column-name
/// alignment in `concat` relies on this.
pub fn unique_headers<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<String> = Vec::new();

    for (i, header) in headers.into_iter().enumerate() {
        let header: String = header.into();
        let base = if header.trim().is_empty() { format!("Unnamed: {}", i) } else { header };

        let mut name = base.clone();
        while columns.contains(&name) {
            let n = seen.entry(base.clone()).or_insert(0);
            *n += 1;
            name = format!("{}.{}", base, n);
        }
        columns.push(name);
    }

    columns
}

pub fn load_table(path: &Path) -> Result<Table> {
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(|s: &str| s.to_lowercase())
        .ok_or_else(|| anyhow!("Input table {:?} has no extension", path))?;

    let table = match extension.as_str() {
        "csv" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
            read_csv(file).with_context(|| format!("Failed to parse CSV file: {:?}", path))?
        }
        "xlsx" | "xlsm" | "xls" | "ods" => load_workbook(path)?,
        _ => return Err(anyhow!("Unsupported table format: {}", extension)),
    };

    if table.is_empty() {
        tracing::warn!("{:?} has no data rows", path);
    } else {
        tracing::debug!("Loaded {} rows from {:?}", table.len(), path);
    }
    Ok(table)
}

pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let columns = unique_headers(rdr.headers()?.iter());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = (0..columns.len())
            .map(|i| match record.get(i) {
                Some(s) if !s.is_empty() => Cell::Text(s.to_string()),
                _ => Cell::Empty,
            })
            .collect();
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

// First worksheet, first row as header.
fn load_workbook(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {:?}", path))?;
    let range = workbook.worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {:?} has no worksheets", path))?
        .with_context(|| format!("Failed to read first worksheet of {:?}", path))?;

    let mut rows_iter = range.rows();
    let columns: Vec<String> = match rows_iter.next() {
        Some(header) => unique_headers(header.iter().map(|c| c.to_string())),
        None => return Ok(Table::default()),
    };

    let rows = rows_iter
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(Cell::from).collect();
            cells.resize(columns.len(), Cell::Empty);
            cells
        })
        .collect();

    Ok(Table { columns, rows })
}
