//! User configuration (`~/.cockpitmap/config.ini`).
//!
//! ```ini
//! [follow]
//! resume_delay_ms = 5000
//! nav_zoom = 17
//! nav_tilt = 45
//! locate_zoom = 15
//! first_fix_zoom = 15
//!
//! [overlay]
//! route_padding_px = 120
//! marker_hit_radius_m = 100
//! destination_zoom = 15
//!
//! [feed]
//! track_window = 10
//! min_track_distance_m = 10
//!
//! [storage]
//! last_location = ~/.cockpitmap/last_location.json
//! ```
//!
//! A missing file means defaults. Keys that are absent keep their default.

mod file;
mod parser;
mod writer;

pub use file::{
    config_directory, config_file_path, default_last_location_path, ConfigFile, ConfigFileError,
    StorageSettings,
};
