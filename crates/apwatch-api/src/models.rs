// Device listing response types
//
// `stat/device` wraps its payload as `{ "meta": {...}, "data": [...] }`.
// Only `data` is read. Fields outside the identifying ones default when
// absent because non-AP devices are inconsistent about what they report.

use serde::{Deserialize, Serialize};

/// The `type` value the controller uses for access points.
pub const ACCESS_POINT_TYPE: &str = "uap";

/// Body of `GET /api/s/{site}/stat/device`.
#[derive(Debug, Deserialize)]
pub struct DeviceListResponse {
    pub data: Vec<DeviceRecord>,
}

/// One device entry from `stat/device`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub mac: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: String,
    #[serde(rename = "type")]
    pub device_type: String,
    /// 0=offline, 1=online, 2=pending, 4=upgrading, 5=provisioning
    #[serde(default)]
    pub state: i64,
    #[serde(default)]
    pub adopted: bool,
}

impl DeviceRecord {
    pub fn is_access_point(&self) -> bool {
        self.device_type == ACCESS_POINT_TYPE
    }
}
