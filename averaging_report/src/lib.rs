// Reporting sinks for an averaging run. The engine hands over its StatResult rows
// (and the locations of the images it saved); this crate turns them into the
// artifacts a person reads: a CSV table, a JSON summary and an HTML document.

pub mod csv_table;
pub mod html_document;

use anyhow::Context;
use noise_averaging::StatResult;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use csv_table::StatsCsv;
pub use html_document::{GroupFigure, HtmlDocument};

pub const CSV_FILE_NAME: &str = "results.csv";
pub const JSON_FILE_NAME: &str = "results.json";
pub const HTML_FILE_NAME: &str = "report.html";

/// Machine-readable record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub sample_count: usize,
    pub seed: Option<u64>,
    pub stats: Vec<StatResult>,
}

/// Everything the sinks need, with image locations relative to the output directory.
#[derive(Debug, Clone)]
pub struct ReportInput {
    pub title: String,
    pub reference_href: String,
    pub summary: RunSummary,
    /// One href per entry of `summary.stats`, same order.
    pub group_image_hrefs: Vec<String>,
}

/// Paths of the files a report run wrote.
#[derive(Debug, Clone)]
pub struct WrittenReport {
    pub csv: PathBuf,
    pub json: PathBuf,
    pub html: PathBuf,
}

pub fn write_reports(output_dir: &Path, input: &ReportInput) -> anyhow::Result<WrittenReport> {
    anyhow::ensure!(
        input.group_image_hrefs.len() == input.summary.stats.len(),
        "{} group images for {} statistics rows",
        input.group_image_hrefs.len(),
        input.summary.stats.len()
    );
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating report directory {}", output_dir.display()))?;

    let csv = output_dir.join(CSV_FILE_NAME);
    fs::write(&csv, StatsCsv::from_rows(&input.summary.stats).to_csv())
        .with_context(|| format!("writing {}", csv.display()))?;

    let json = output_dir.join(JSON_FILE_NAME);
    let summary = serde_json::to_string_pretty(&input.summary)?;
    fs::write(&json, summary).with_context(|| format!("writing {}", json.display()))?;

    let mut document = HtmlDocument::new(input.title.clone(), input.reference_href.clone());
    for (stat, href) in input.summary.stats.iter().zip(&input.group_image_hrefs) {
        document.add_figure(GroupFigure {
            stat: *stat,
            image_href: href.clone(),
        });
    }
    let html = output_dir.join(HTML_FILE_NAME);
    fs::write(&html, document.to_html()).with_context(|| format!("writing {}", html.display()))?;

    Ok(WrittenReport { csv, json, html })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ReportInput {
        ReportInput {
            title: "Image Denoising Through Averaging".to_string(),
            reference_href: "original.png".to_string(),
            summary: RunSummary {
                sample_count: 10,
                seed: Some(4),
                stats: vec![
                    StatResult {
                        k: 1,
                        average: 127.0,
                        variance: 900.0,
                    },
                    StatResult {
                        k: 10,
                        average: 127.5,
                        variance: 90.0,
                    },
                ],
            },
            group_image_hrefs: vec![
                "result_for_1_samples.png".to_string(),
                "result_for_10_samples.png".to_string(),
            ],
        }
    }

    #[test]
    fn writes_all_three_sinks() {
        let dir = tempfile::tempdir().expect("temp dir");
        let written = write_reports(dir.path(), &input()).expect("write reports");

        let csv = fs::read_to_string(&written.csv).expect("csv");
        assert!(csv.starts_with("Sample Groups,Average,Average Variance\n"));
        assert!(csv.contains("10,127.5,90\n"));

        let json = fs::read_to_string(&written.json).expect("json");
        let summary: RunSummary = serde_json::from_str(&json).expect("summary");
        assert_eq!(summary, input().summary);

        let html = fs::read_to_string(&written.html).expect("html");
        assert!(html.contains("result_for_10_samples.png"));
    }

    #[test]
    fn rejects_mismatched_image_list() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut bad = input();
        bad.group_image_hrefs.pop();
        assert!(write_reports(dir.path(), &bad).is_err());
    }
}
