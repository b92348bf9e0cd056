mod entity;
mod mac_address;
mod repository;
mod status;

pub use entity::{
    DEFAULT_DEVICE_TYPE, DEFAULT_SERVICE_UUID, Device, DeviceStatistics, DeviceUpdate, NewDevice,
    validate_ssid,
};
pub use mac_address::MacAddress;
pub use repository::DeviceRepository;
pub use status::DeviceStatus;
