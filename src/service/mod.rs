pub mod mqtt_init;
pub mod registration;

pub use registration::{ClaimOutcome, RegistrationService, normalize_entry_code};
