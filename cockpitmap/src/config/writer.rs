//! INI serialization for `config.ini`.

use super::file::ConfigFile;

/// Render a commented INI document.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let follow = &config.follow;
    let overlay = &config.overlay;
    let feed = &config.feed;

    format!(
        r#"[follow]
; Quiet period after the last map touch before follow resumes (milliseconds)
resume_delay_ms = {resume_delay_ms}
; Zoom and tilt applied when follow starts (tilt 0-60 degrees)
nav_zoom = {nav_zoom}
nav_tilt = {nav_tilt}
; Zoom for "locate me"
locate_zoom = {locate_zoom}
; Zoom for the first fix and the restored last location
first_fix_zoom = {first_fix_zoom}

[overlay]
; Padding around a drawn route when framing it (pixels)
route_padding_px = {route_padding_px}
; Long-press distance that counts as hitting the destination marker (meters)
marker_hit_radius_m = {marker_hit_radius_m}
; Zoom when focusing a new destination
destination_zoom = {destination_zoom}

[feed]
; Positions kept to derive a heading when the provider reports none
track_window = {track_window}
; Minimum movement across that window before the heading is trusted (meters)
min_track_distance_m = {min_track_distance_m}

[storage]
; Last known location, restored on start
last_location = {last_location}
"#,
        resume_delay_ms = follow.resume_delay.as_millis(),
        nav_zoom = follow.nav_zoom,
        nav_tilt = follow.nav_tilt,
        locate_zoom = follow.locate_zoom,
        first_fix_zoom = follow.first_fix_zoom,
        route_padding_px = overlay.route_padding_px,
        marker_hit_radius_m = overlay.marker_hit_radius_m,
        destination_zoom = overlay.destination_zoom,
        track_window = feed.track_window,
        min_track_distance_m = feed.min_track_distance_m,
        last_location = config.storage.last_location.display(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_expected_keys() {
        let text = to_config_string(&ConfigFile::default());
        assert!(text.contains("resume_delay_ms = 5000"));
        assert!(text.contains("nav_tilt = 45"));
        assert!(text.contains("route_padding_px = 120"));
        assert!(text.contains("marker_hit_radius_m = 100"));
        assert!(text.contains("track_window = 10"));
    }

    #[test]
    fn test_rendered_text_parses_back() {
        let config = ConfigFile::default();
        let parsed = ConfigFile::from_ini_str(&to_config_string(&config)).unwrap();
        assert_eq!(parsed, config);
    }
}
