//! Configuration module for voicecrm
//!
//! Handles loading and managing application settings from TOML files.

mod settings;

pub use settings::{ApiSettings, GeneralSettings, Settings, TuiSettings};
