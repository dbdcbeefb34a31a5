// THEORY:
// The report feed is the JSON the dashboard polls for its two line charts:
// vehicles seen per day and vehicle images captured per day. This module only
// types that feed and reshapes it into the label/count series a chart backend
// consumes. Drawing the chart is somebody else's job.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// One day's total, as served by `/admin/reports.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPoint {
    /// ISO-8601 date or timestamp.
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Total")]
    pub total: u64,
}

impl ReportPoint {
    /// `MM-DD` label for the x axis. Falls back to the raw string when it is
    /// not a recognizable date.
    pub fn label(&self) -> String {
        if let Ok(stamp) = DateTime::parse_from_rfc3339(&self.date) {
            return stamp.format("%m-%d").to_string();
        }
        let day = self.date.get(..10).unwrap_or(&self.date);
        match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            Ok(date) => date.format("%m-%d").to_string(),
            Err(_) => self.date.clone(),
        }
    }
}

/// Both series of the report endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFeed {
    #[serde(rename = "Vehicles", default)]
    pub vehicles: Vec<ReportPoint>,
    #[serde(rename = "VehicleImages", default)]
    pub vehicle_images: Vec<ReportPoint>,
}

impl ReportFeed {
    pub fn from_json(json: &str) -> Result<Self, DashboardError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Splits points into parallel label and count vectors.
pub fn series(points: &[ReportPoint]) -> (Vec<String>, Vec<u64>) {
    points.iter().map(|p| (p.label(), p.total)).unzip()
}

pub const DATASET_LABEL: &str = "Users Report";
const SERIES_FILL: &str = "rgba(151,187,205,0.2)";
const SERIES_LINE: &str = "rgba(151,187,205,1)";
const POINT_HIGHLIGHT: &str = "#fff";

/// One line of a chart, styled for the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub fill_color: String,
    pub stroke_color: String,
    pub point_color: String,
    pub point_stroke_color: String,
    pub point_highlight_fill: String,
    pub point_highlight_stroke: String,
    pub data: Vec<u64>,
}

/// What a chart backend receives for one canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    /// Single-series line chart in the dashboard style.
    pub fn line(labels: Vec<String>, counts: Vec<u64>) -> Self {
        Self {
            labels,
            datasets: vec![Dataset {
                label: DATASET_LABEL.to_string(),
                fill_color: SERIES_FILL.to_string(),
                stroke_color: SERIES_LINE.to_string(),
                point_color: SERIES_LINE.to_string(),
                point_stroke_color: POINT_HIGHLIGHT.to_string(),
                point_highlight_fill: POINT_HIGHLIGHT.to_string(),
                point_highlight_stroke: SERIES_LINE.to_string(),
                data: counts,
            }],
        }
    }

    pub fn from_points(points: &[ReportPoint]) -> Self {
        let (labels, counts) = series(points);
        Self::line(labels, counts)
    }
}
