//! INI parsing: the one place where key names map to struct fields.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use ini::{Ini, Properties};

use super::file::{ConfigFile, ConfigFileError};

/// Parse an `Ini` into a `ConfigFile`, starting from defaults.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [follow] section
    if let Some(section) = ini.section(Some("follow")) {
        if let Some(ms) = parse_key::<u64>(section, "follow", "resume_delay_ms")? {
            if ms == 0 {
                return Err(invalid("follow", "resume_delay_ms", ms, "must be greater than 0"));
            }
            config.follow.resume_delay = Duration::from_millis(ms);
        }
        if let Some(zoom) = parse_zoom(section, "nav_zoom")? {
            config.follow.nav_zoom = zoom;
        }
        if let Some(tilt) = parse_key::<f32>(section, "follow", "nav_tilt")? {
            if !(0.0..=60.0).contains(&tilt) {
                return Err(invalid("follow", "nav_tilt", tilt, "must be between 0 and 60"));
            }
            config.follow.nav_tilt = tilt;
        }
        if let Some(zoom) = parse_zoom(section, "locate_zoom")? {
            config.follow.locate_zoom = zoom;
        }
        if let Some(zoom) = parse_zoom(section, "first_fix_zoom")? {
            config.follow.first_fix_zoom = zoom;
        }
    }

    // [overlay] section
    if let Some(section) = ini.section(Some("overlay")) {
        if let Some(px) = parse_key::<u32>(section, "overlay", "route_padding_px")? {
            config.overlay.route_padding_px = px;
        }
        if let Some(radius) = parse_key::<f64>(section, "overlay", "marker_hit_radius_m")? {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(invalid(
                    "overlay",
                    "marker_hit_radius_m",
                    radius,
                    "must be a positive number of meters",
                ));
            }
            config.overlay.marker_hit_radius_m = radius;
        }
        if let Some(v) = section.get("destination_zoom") {
            config.overlay.destination_zoom = check_zoom("overlay", "destination_zoom", v)?;
        }
    }

    // [feed] section
    if let Some(section) = ini.section(Some("feed")) {
        if let Some(window) = parse_key::<usize>(section, "feed", "track_window")? {
            if window < 2 {
                return Err(invalid("feed", "track_window", window, "must be at least 2"));
            }
            config.feed.track_window = window;
        }
        if let Some(distance) = parse_key::<f64>(section, "feed", "min_track_distance_m")? {
            if !(distance.is_finite() && distance >= 0.0) {
                return Err(invalid(
                    "feed",
                    "min_track_distance_m",
                    distance,
                    "must be zero or a positive number of meters",
                ));
            }
            config.feed.min_track_distance_m = distance;
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("last_location") {
            let v = v.trim();
            if !v.is_empty() {
                config.storage.last_location = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn parse_key<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    let v = v.trim();
    v.parse().map(Some).map_err(|_| ConfigFileError::InvalidValue {
        section: section_name.to_string(),
        key: key.to_string(),
        value: v.to_string(),
        reason: "not a valid number".to_string(),
    })
}

fn parse_zoom(section: &Properties, key: &str) -> Result<Option<f32>, ConfigFileError> {
    section
        .get(key)
        .map(|v| check_zoom("follow", key, v))
        .transpose()
}

fn check_zoom(section: &str, key: &str, value: &str) -> Result<f32, ConfigFileError> {
    let value = value.trim();
    match value.parse::<f32>() {
        Ok(zoom) if (3.0..=20.0).contains(&zoom) => Ok(zoom),
        _ => Err(invalid(section, key, value, "must be a zoom level between 3 and 20")),
    }
}

fn invalid(
    section: &str,
    key: &str,
    value: impl ToString,
    reason: &str,
) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_tilde(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(rest),
        None => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(contents: &str) -> Result<ConfigFile, ConfigFileError> {
        ConfigFile::from_ini_str(contents)
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_partial_follow_section() {
        let config = parse("[follow]\nresume_delay_ms = 2500\nnav_tilt = 30\n").unwrap();
        assert_eq!(config.follow.resume_delay, Duration::from_millis(2_500));
        assert_eq!(config.follow.nav_tilt, 30.0);
        assert_eq!(config.follow.nav_zoom, 17.0);
    }

    #[test]
    fn test_invalid_number_reports_key() {
        let err = parse("[overlay]\nroute_padding_px = wide\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue {
                section, key, value, ..
            } => {
                assert_eq!(section, "overlay");
                assert_eq!(key, "route_padding_px");
                assert_eq!(value, "wide");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_tilt_out_of_range() {
        assert!(matches!(
            parse("[follow]\nnav_tilt = 75\n"),
            Err(ConfigFileError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_zero_resume_delay_rejected() {
        assert!(parse("[follow]\nresume_delay_ms = 0\n").is_err());
    }

    #[test]
    fn test_zoom_range() {
        assert!(parse("[follow]\nlocate_zoom = 25\n").is_err());
        assert!(parse("[overlay]\ndestination_zoom = 1\n").is_err());
        let config = parse("[overlay]\ndestination_zoom = 16\n").unwrap();
        assert_eq!(config.overlay.destination_zoom, 16.0);
    }

    #[test]
    fn test_track_window_minimum() {
        assert!(parse("[feed]\ntrack_window = 1\n").is_err());
        let config = parse("[feed]\ntrack_window = 4\nmin_track_distance_m = 5.5\n").unwrap();
        assert_eq!(config.feed.track_window, 4);
        assert_eq!(config.feed.min_track_distance_m, 5.5);
    }

    #[test]
    fn test_storage_path_expands_tilde() {
        let config = parse("[storage]\nlast_location = ~/drive/last.json\n").unwrap();
        assert!(config.storage.last_location.ends_with("drive/last.json"));
        assert!(!config.storage.last_location.starts_with("~"));
    }
}
