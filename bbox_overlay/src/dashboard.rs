// THEORY:
// The `DashboardController` owns everything stateful about the report panel:
// the selected date range, the two live chart handles, and whether each chart
// is still showing its loading indicator. Handles have an explicit lifecycle:
//
// - **Create**: `render` asks the backend for a new chart per canvas.
// - **Replace**: a later `render` destroys the previous handle first, so a
//   canvas never has two charts bound to it.
// - **Destroy**: `destroy` (or dropping the controller) releases both.
//
// The actual drawing is delegated to a `ChartBackend`; the dashboard is not a
// charting engine.

use chrono::NaiveDate;
use tracing::debug;

use crate::core_modules::date_range::{DateRange, RangeShortcut};
use crate::core_modules::report::{ChartData, ReportFeed};
use crate::error::DashboardError;

pub const VEHICLES_CANVAS: &str = "vehicles_report";
pub const VEHICLE_IMAGES_CANVAS: &str = "vehicle_images_report";
pub const REPORT_ENDPOINT: &str = "/admin/reports.json";

/// Something that can draw a line chart onto a named canvas.
pub trait ChartBackend {
    type Handle;

    fn create(&mut self, canvas: &str, data: &ChartData) -> Result<Self::Handle, DashboardError>;

    fn destroy(&mut self, handle: Self::Handle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    Vehicles,
    VehicleImages,
}

impl Chart {
    pub fn canvas(&self) -> &'static str {
        match self {
            Chart::Vehicles => VEHICLES_CANVAS,
            Chart::VehicleImages => VEHICLE_IMAGES_CANVAS,
        }
    }
}

/// One canvas: its live chart, if any, and its loader flag.
struct ChartSlot<H> {
    handle: Option<H>,
    loading: bool,
}

impl<H> Default for ChartSlot<H> {
    fn default() -> Self {
        Self {
            handle: None,
            loading: true,
        }
    }
}

pub struct DashboardController<B: ChartBackend> {
    backend: B,
    range: DateRange,
    vehicles: ChartSlot<B::Handle>,
    vehicle_images: ChartSlot<B::Handle>,
}

impl<B: ChartBackend> DashboardController<B> {
    /// Starts on the default range (the seven days ending yesterday) with both
    /// loaders showing.
    pub fn new(backend: B, today: NaiveDate) -> Self {
        Self {
            backend,
            range: DateRange::for_shortcut(RangeShortcut::Default, today),
            vehicles: ChartSlot::default(),
            vehicle_images: ChartSlot::default(),
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn set_range(&mut self, range: DateRange) {
        self.range = range;
    }

    pub fn apply_shortcut(&mut self, shortcut: RangeShortcut, today: NaiveDate) -> DateRange {
        self.range = DateRange::for_shortcut(shortcut, today);
        self.range
    }

    /// Relative URL of the report request for the current range.
    pub fn report_url(&self) -> String {
        let [(start_key, start), (end_key, end)] = self.range.query_pairs();
        format!("{REPORT_ENDPOINT}?{start_key}={start}&{end_key}={end}")
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn slot_mut(&mut self, chart: Chart) -> &mut ChartSlot<B::Handle> {
        match chart {
            Chart::Vehicles => &mut self.vehicles,
            Chart::VehicleImages => &mut self.vehicle_images,
        }
    }

    fn slot(&self, chart: Chart) -> &ChartSlot<B::Handle> {
        match chart {
            Chart::Vehicles => &self.vehicles,
            Chart::VehicleImages => &self.vehicle_images,
        }
    }

    pub fn is_loading(&self, chart: Chart) -> bool {
        self.slot(chart).loading
    }

    pub fn handle(&self, chart: Chart) -> Option<&B::Handle> {
        self.slot(chart).handle.as_ref()
    }

    /// Replaces both charts with the series in `feed` and hides the loaders.
    pub fn render(&mut self, feed: &ReportFeed) -> Result<(), DashboardError> {
        self.replace(Chart::Vehicles, &ChartData::from_points(&feed.vehicles))?;
        self.replace(Chart::VehicleImages, &ChartData::from_points(&feed.vehicle_images))?;
        Ok(())
    }

    /// The loader stays up until the new chart exists.
    fn replace(&mut self, chart: Chart, data: &ChartData) -> Result<(), DashboardError> {
        let slot = self.slot_mut(chart);
        slot.loading = true;
        if let Some(old) = slot.handle.take() {
            debug!(canvas = chart.canvas(), "destroying previous chart");
            self.backend.destroy(old);
        }
        let handle = self.backend.create(chart.canvas(), data)?;
        let slot = self.slot_mut(chart);
        slot.handle = Some(handle);
        slot.loading = false;
        Ok(())
    }

    /// Destroys both charts and shows the loaders again.
    pub fn destroy(&mut self) {
        for chart in [Chart::Vehicles, Chart::VehicleImages] {
            let slot = self.slot_mut(chart);
            slot.loading = true;
            if let Some(handle) = slot.handle.take() {
                self.backend.destroy(handle);
            }
        }
    }
}

impl<B: ChartBackend> Drop for DashboardController<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Fetches the report feed for `range` from `base_url`.
#[cfg(feature = "http")]
pub async fn fetch_report(
    client: &reqwest::Client,
    base_url: &str,
    range: &DateRange,
) -> Result<ReportFeed, DashboardError> {
    let url = format!("{}{REPORT_ENDPOINT}", base_url.trim_end_matches('/'));
    let feed = client
        .get(url)
        .query(&range.query_pairs())
        .send()
        .await?
        .error_for_status()?
        .json::<ReportFeed>()
        .await?;
    Ok(feed)
}
