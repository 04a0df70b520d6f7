//! Persisted, observable settings.
//!
//! - [`ConfigStore`]: the JSON document on disk
//! - [`ConfigValue`] / [`ConfigContext`]: typed cells with change notification
//! - [`Settings`]: the catalogue of every setting the application uses

mod settings;
mod store;
mod value;

pub use settings::{Settings, default_game_dir, keys};
pub use store::ConfigStore;
pub use value::{ConfigContext, ConfigSubscription, ConfigValue, DynSetting, SettingValue};
