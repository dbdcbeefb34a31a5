use bbox_overlay::core_modules::report::ChartData;
use bbox_overlay::dashboard::ChartBackend;
use bbox_overlay::error::DashboardError;
use serde_json::{Map, Value};

/// Chart backend that keeps each live chart as JSON, keyed by canvas id.
#[derive(Debug, Default)]
pub struct JsonChartSink {
    charts: Map<String, Value>,
}

impl JsonChartSink {
    pub fn snapshot(&self) -> Value {
        Value::Object(self.charts.clone())
    }
}

impl ChartBackend for JsonChartSink {
    type Handle = String;

    fn create(&mut self, canvas: &str, data: &ChartData) -> Result<String, DashboardError> {
        let value = serde_json::to_value(data)?;
        self.charts.insert(canvas.to_string(), value);
        Ok(canvas.to_string())
    }

    fn destroy(&mut self, handle: String) {
        self.charts.remove(&handle);
    }
}
