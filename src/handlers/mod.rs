pub mod devices;
pub mod home;

pub use devices::{list_devices, register};
pub use home::home;
