use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dashboard::{ChartConfig, ChartDataPoint, ChartModule};

#[derive(Debug, Deserialize)]
pub struct CreateModuleRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub module_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub duration_secs: i64,
}

/// `from`/`to` as `YYYY-MM-DD`, both inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct ChartQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartResponse {
    pub chart_data: Vec<ChartDataPoint>,
    pub chart_config: ChartConfig,
    pub modules: Vec<ChartModule>,
}
