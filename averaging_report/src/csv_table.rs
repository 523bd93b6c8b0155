//! CSV sink for the per-group statistics table.

use noise_averaging::StatResult;

const HEADER: [&str; 3] = ["Sample Groups", "Average", "Average Variance"];

/// Accumulates `StatResult` rows and renders them as CSV.
#[derive(Debug, Default)]
pub struct StatsCsv {
    rows: Vec<StatResult>,
}

impl StatsCsv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: &[StatResult]) -> Self {
        Self {
            rows: rows.to_vec(),
        }
    }

    pub fn add_row(&mut self, row: StatResult) {
        self.rows.push(row);
    }

    fn header() -> String {
        HEADER.join(",")
    }

    fn format_row(row: &StatResult) -> String {
        // `{}` on f64 prints the shortest representation that round-trips.
        format!("{},{},{}", row.k, row.average, row.variance)
    }

    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        output.push_str(&Self::header());
        output.push('\n');
        for row in &self.rows {
            output.push_str(&Self::format_row(row));
            output.push('\n');
        }
        output
    }
}
