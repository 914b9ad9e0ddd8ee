// apwatch-api: controller login negotiation (UniFi OS + legacy) and device listing

pub mod dialect;
pub mod error;
pub mod models;
pub mod session;
pub mod transport;

pub use dialect::{Dialect, LOGIN_STRATEGIES, LoginStrategy, device_list_url, parse_base_url};
pub use error::Error;
pub use models::{ACCESS_POINT_TYPE, DeviceListResponse, DeviceRecord};
pub use session::{ControllerCredentials, ControllerSession};
pub use transport::TransportConfig;
