//! Configuration file handling for ~/.tiershift/config.ini.
//!
//! Settings structs live in [`settings`], INI parsing in [`parser`],
//! size parsing in [`size`], and file loading in [`file`].

mod file;
mod parser;
mod settings;
mod size;

pub use file::{config_directory, config_file_path, SettingsError};
pub use settings::{CacheSettings, GeneralSettings, Settings, WorkerSettings};
pub use size::{format_size, parse_size, SizeParseError};
