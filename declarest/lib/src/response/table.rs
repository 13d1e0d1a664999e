//! Columnar container for arrays of maps.

use indexmap::{IndexMap, IndexSet};
use serde::{Serialize, Serializer};

use super::value::ResponseValue;

/// A single table row: column name to cell value.
pub type Row = IndexMap<String, ResponseValue>;

/// Rows sharing one column set.
///
/// The columns are the union of every source row's keys, in first-seen
/// order. Every row holds every column; cells a source row lacked are
/// [`ResponseValue::Null`]. A table is never mutated after construction.
///
/// ## Examples
///
/// ```
/// use declarest_lib::response::{DataTable, ResponseValue, tabularize};
/// use serde_json::json;
///
/// let table = tabularize(json!([{"a": 1, "b": "x"}, {"a": 2, "c": "y"}]))
///     .into_table()
///     .unwrap();
///
/// assert_eq!(table.keys(), ["a", "b", "c"]);
/// assert_eq!(table.row(1).unwrap()["b"], ResponseValue::Null);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl DataTable {
    /// Builds a table from rows with possibly differing key sets.
    pub fn from_rows(rows: impl IntoIterator<Item = Row>) -> Self {
        let rows: Vec<Row> = rows.into_iter().collect();

        let columns: IndexSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let columns: Vec<String> = columns.into_iter().map(str::to_string).collect();

        let rows = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|col| (col.clone(), row.swap_remove(col).unwrap_or_default()))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Column names.
    pub fn keys(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Every cell of `name`, or `None` when there is no such column.
    pub fn column(&self, name: &str) -> Option<Vec<&ResponseValue>> {
        if !self.columns.iter().any(|c| c == name) {
            return None;
        }
        Some(self.rows.iter().filter_map(|row| row.get(name)).collect())
    }

    /// A new table with only the named columns, in the order given.
    ///
    /// Names that are not columns of this table are skipped.
    pub fn columns<S: AsRef<str>>(&self, names: &[S]) -> DataTable {
        let selected: IndexSet<&str> = names
            .iter()
            .map(|name| name.as_ref())
            .filter(|name| self.columns.iter().any(|c| c == *name))
            .collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                selected
                    .iter()
                    .map(|name| {
                        let cell = row.get(*name).cloned().unwrap_or_default();
                        (name.to_string(), cell)
                    })
                    .collect()
            })
            .collect();

        DataTable {
            columns: selected.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    /// Column-major view: column name to its cells.
    pub fn to_columns(&self) -> IndexMap<String, Vec<ResponseValue>> {
        self.columns
            .iter()
            .map(|col| {
                let cells = self
                    .rows
                    .iter()
                    .map(|row| row.get(col).cloned().unwrap_or_default())
                    .collect();
                (col.clone(), cells)
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a DataTable {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl Serialize for DataTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.rows.serialize(serializer)
    }
}
