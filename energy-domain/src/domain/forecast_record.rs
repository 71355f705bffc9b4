use serde::{Deserialize, Serialize};

use crate::timestamp::Timestamp;

/// One predicted hour. Field order is the JSON key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    #[serde(with = "crate::timestamp::iso")]
    pub timestamp: Timestamp,
    pub predicted_consumption: f64,
}
