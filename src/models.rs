//! Data models for the plotting pipeline.
//!
//! This module contains the working table loaded from CSV exports and the
//! reduced shapes (categorical series, rating tables) handed to the renderer.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::collections::HashMap;

/// The merged in-memory dataset built from every loaded CSV file.
///
/// Cells are kept as optional strings; numeric views are parsed on demand.
/// A `None` cell is either an empty CSV field or a column that the source
/// file did not have.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Creates an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or truncating it to the column count.
    ///
    /// The loader rejects rows wider than the header before they get here.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Column names in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Appends all rows of `other`, taking the union of both column sets.
    ///
    /// Columns keep their first-appearance order. Rows that lack a column
    /// hold a missing cell for it.
    pub fn append(&mut self, other: Table) {
        let mut mapping = Vec::with_capacity(other.columns.len());
        for name in &other.columns {
            let idx = match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    for row in &mut self.rows {
                        row.push(None);
                    }
                    self.columns.len() - 1
                }
            };
            mapping.push(idx);
        }

        let width = self.columns.len();
        for row in other.rows {
            let mut aligned = vec![None; width];
            for (cell, &idx) in row.into_iter().zip(&mapping) {
                aligned[idx] = cell;
            }
            self.rows.push(aligned);
        }
    }

    /// Mutable access to every cell of every row.
    pub fn cells_mut(&mut self) -> impl Iterator<Item = &mut Option<String>> {
        self.rows.iter_mut().flat_map(|row| row.iter_mut())
    }

    /// Rows whose `column` cell equals `value`.
    ///
    /// An unknown column yields an empty table with the same columns.
    pub fn filter_eq(&self, column: &str, value: &str) -> Table {
        let rows = match self.column_index(column) {
            Some(idx) => self
                .rows
                .iter()
                .filter(|row| row[idx].as_deref() == Some(value))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Distribution of the non-missing values of a column.
    pub fn value_counts(&self, column: &str) -> Option<CategoricalSeries> {
        let values = self.column(column)?;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for value in values.into_iter().flatten() {
            *counts.entry(value).or_insert(0) += 1;
        }

        let mut entries: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(label, count)| (label.to_string(), count))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Some(CategoricalSeries::from_pairs(entries))
    }

    /// Numeric values of a column; cells that do not parse are skipped.
    pub fn numeric_column(&self, column: &str) -> Option<Vec<f64>> {
        let values = self.column(column)?;
        Some(values.into_iter().flatten().filter_map(parse_number).collect())
    }

    /// `(x, y)` pairs for rows where both cells parse as numbers.
    pub fn numeric_pairs(&self, x: &str, y: &str) -> Option<Vec<(f64, f64)>> {
        let xi = self.column_index(x)?;
        let yi = self.column_index(y)?;
        Some(
            self.rows
                .iter()
                .filter_map(|row| {
                    let xv = row[xi].as_deref().and_then(parse_number)?;
                    let yv = row[yi].as_deref().and_then(parse_number)?;
                    Some((xv, yv))
                })
                .collect(),
        )
    }

    /// Builds a rating table from a numeric column and a grouping column.
    pub fn rating_table(&self, rating: &str, group: &str) -> Option<RatingTable> {
        let ri = self.column_index(rating)?;
        let gi = self.column_index(group)?;
        let rows = self
            .rows
            .iter()
            .filter_map(|row| {
                let value = row[ri].as_deref().and_then(parse_number)?;
                let label = row[gi].clone()?;
                Some(RatingRow {
                    rating: value,
                    group: label,
                })
            })
            .collect();
        Some(RatingTable { rows })
    }
}

/// Parses a cell as a number, accepting a decimal comma.
pub fn parse_number(cell: &str) -> Option<f64> {
    let trimmed = cell.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .or_else(|| trimmed.replace(',', ".").parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Month names used by German form exports.
const GERMAN_MONTHS: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];

/// Parses a form export timestamp such as
/// `Montag, 2. Oktober 2023 um 10:11:12 GMT+0:00`.
///
/// Returns `None` for anything that does not follow that layout.
pub fn parse_export_timestamp(cell: &str) -> Option<DateTime<Utc>> {
    let (_weekday, rest) = cell.trim().split_once(", ")?;
    let rest = rest.strip_suffix(" GMT+0:00")?;
    let (date, time) = rest.split_once(" um ")?;

    let mut parts = date.split(' ');
    let day: u32 = parts.next()?.strip_suffix('.')?.parse().ok()?;
    let month_name = parts.next()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = GERMAN_MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;

    let time = NaiveTime::parse_from_str(time, "%H:%M:%S").ok()?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_time(time);
    Some(Utc.from_utc_datetime(&naive))
}

/// Mapping from category label to count.
///
/// Entries keep insertion order; charts that need a stable order sort
/// explicitly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoricalSeries {
    entries: Vec<(String, u64)>,
}

impl CategoricalSeries {
    /// Builds a series from label/count pairs. Repeated labels are summed.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut series = Self::default();
        for (label, count) in pairs {
            series.add_count(label.into(), count);
        }
        series
    }

    fn add_count(&mut self, label: String, count: u64) {
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 += count,
            None => self.entries.push((label, count)),
        }
    }

    /// Count for a label.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(l, c)| (l.as_str(), *c))
    }

    /// Entries ordered by label.
    pub fn sorted_by_label(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }

    /// Removes a label if present.
    pub fn without(mut self, label: &str) -> Self {
        self.entries.retain(|(l, _)| l != label);
        self
    }

    /// Renames a label, merging into an existing label of the new name.
    pub fn renamed(self, from: &str, to: &str) -> Self {
        Self::from_pairs(self.entries.into_iter().map(|(label, count)| {
            if label == from {
                (to.to_string(), count)
            } else {
                (label, count)
            }
        }))
    }

    /// Union of both label sets with counts summed.
    pub fn combined(mut self, other: &CategoricalSeries) -> Self {
        for (label, count) in other.iter() {
            self.add_count(label.to_string(), count);
        }
        self
    }
}

/// One rating with the group it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingRow {
    pub rating: f64,
    pub group: String,
}

/// Rows of `(rating, group)` pairs feeding density charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingTable {
    pub rows: Vec<RatingRow>,
}

impl RatingTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (f64, S)>,
        S: Into<String>,
    {
        Self {
            rows: pairs
                .into_iter()
                .map(|(rating, group)| RatingRow {
                    rating,
                    group: group.into(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct group labels in first-appearance order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for row in &self.rows {
            if !groups.contains(&row.group.as_str()) {
                groups.push(&row.group);
            }
        }
        groups
    }

    /// Ratings belonging to one group.
    pub fn ratings_for(&self, group: &str) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|row| row.group == group)
            .map(|row| row.rating)
            .collect()
    }

    /// Every rating regardless of group.
    pub fn ratings(&self) -> Vec<f64> {
        self.rows.iter().map(|row| row.rating).collect()
    }

    /// Mean rating per group, in group order.
    pub fn group_means(&self) -> Vec<(String, f64)> {
        self.groups()
            .into_iter()
            .filter_map(|group| mean(&self.ratings_for(group)).map(|m| (group.to_string(), m)))
            .collect()
    }

    /// Mean over all ratings.
    pub fn mean(&self) -> Option<f64> {
        mean(&self.ratings())
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    fn survey_table() -> Table {
        let mut table = Table::new(vec!["Age".to_string(), "Answer".to_string()]);
        table.push_row(vec![cell("20"), cell("Yes")]);
        table.push_row(vec![cell("30"), cell("No")]);
        table.push_row(vec![cell("40"), cell("Yes")]);
        table.push_row(vec![cell("50"), None]);
        table
    }

    #[test]
    fn test_append_takes_column_union() {
        let mut left = Table::new(vec!["a".to_string(), "b".to_string()]);
        left.push_row(vec![cell("1"), cell("2")]);

        let mut right = Table::new(vec!["b".to_string(), "c".to_string()]);
        right.push_row(vec![cell("3"), cell("4")]);

        left.append(right);

        assert_eq!(left.columns(), &["a", "b", "c"]);
        assert_eq!(left.len(), 2);
        assert_eq!(left.column("a").unwrap(), vec![Some("1"), None]);
        assert_eq!(left.column("b").unwrap(), vec![Some("2"), Some("3")]);
        assert_eq!(left.column("c").unwrap(), vec![None, Some("4")]);
    }

    #[test]
    fn test_value_counts_skips_missing() {
        let counts = survey_table().value_counts("Answer").unwrap();
        assert_eq!(counts.get("Yes"), Some(2));
        assert_eq!(counts.get("No"), Some(1));
        assert_eq!(counts.total(), 3);
        assert!(survey_table().value_counts("Missing").is_none());
    }

    #[test]
    fn test_filter_eq() {
        let filtered = survey_table().filter_eq("Answer", "Yes");
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            filtered.numeric_column("Age").unwrap(),
            vec![20.0, 40.0]
        );
        assert!(survey_table().filter_eq("Nope", "Yes").is_empty());
    }

    #[test]
    fn test_parse_number_accepts_decimal_comma() {
        assert_eq!(parse_number(" 7,5 "), Some(7.5));
        assert_eq!(parse_number("8"), Some(8.0));
        assert_eq!(parse_number("eight"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn test_parse_export_timestamp() {
        let parsed = parse_export_timestamp("Montag, 2. Oktober 2023 um 10:11:12 GMT+0:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 10, 2, 10, 11, 12).unwrap());

        let march = parse_export_timestamp("Freitag, 15. März 2024 um 08:00:59 GMT+0:00").unwrap();
        assert_eq!(march, Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 59).unwrap());
    }

    #[test]
    fn test_parse_export_timestamp_rejects_other_layouts() {
        for cell in [
            "2023-10-02 10:11:12",
            "Montag, 2. October 2023 um 10:11:12 GMT+0:00",
            "Montag, 2. Oktober 2023 um 10:11:12 GMT+2:00",
            "Montag, 31. Februar 2023 um 10:11:12 GMT+0:00",
            "Montag, 2 Oktober 2023 um 10:11:12 GMT+0:00",
            "",
        ] {
            assert_eq!(parse_export_timestamp(cell), None, "{cell:?}");
        }
    }

    #[test]
    fn test_series_rename_drop_combine() {
        let under = CategoricalSeries::from_pairs([("Yes", 5), ("No", 3)]);
        let d_ticket = CategoricalSeries::from_pairs([("Yes", 2), ("No", 1)]);

        let combined = under
            .without("No")
            .combined(&d_ticket.renamed("Yes", "No, D-Ticket"));

        assert_eq!(combined.get("Yes"), Some(5));
        assert_eq!(combined.get("No, D-Ticket"), Some(2));
        assert_eq!(combined.get("No"), Some(1));
        assert_eq!(combined.total(), 8);
    }

    #[test]
    fn test_sorted_by_label_ignores_insertion_order() {
        let a = CategoricalSeries::from_pairs([("b", 1), ("a", 2), ("c", 3)]);
        let b = CategoricalSeries::from_pairs([("c", 3), ("b", 1), ("a", 2)]);
        assert_eq!(a.sorted_by_label(), vec![("a", 2), ("b", 1), ("c", 3)]);
        assert_eq!(a.sorted_by_label(), b.sorted_by_label());
    }

    #[test]
    fn test_rating_table_groups_and_means() {
        let ratings = RatingTable::from_pairs([(2.0, "A"), (4.0, "B"), (6.0, "A")]);
        assert_eq!(ratings.groups(), vec!["A", "B"]);
        assert_eq!(
            ratings.group_means(),
            vec![("A".to_string(), 4.0), ("B".to_string(), 4.0)]
        );
        assert_eq!(ratings.mean(), Some(4.0));
        assert_eq!(mean(&[]), None);
    }
}
