//! External API integrations

pub mod platform;

pub use platform::PlatformClient;
