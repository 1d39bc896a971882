//! Logical to physical scale detection.
//!
//! The chain, first hit wins:
//! 1. `GTK_SCALE`, `GDK_SCALE`, `QT_SCALE_FACTOR` (first positive number)
//! 2. `Xft.dpi` from the x resource manager string
//! 3. physical dpi of the screen, only if it is within [72, 300]
//! 4. 1.0
//!
//! macos and windows don't use this. their backing size queries already return physical pixels and
//! they report a scale of 1.0.

/// environment variables checked, in priority order
pub const SCALE_ENV_VARS: [&str; 3] = ["GTK_SCALE", "GDK_SCALE", "QT_SCALE_FACTOR"];
/// scales that are snapped to when a raw scale is within [`SNAP_DISTANCE`] of them
pub const COMMON_SCALES: [f32; 9] = [0.75, 1.0, 1.25, 1.5, 1.75, 2.0, 2.5, 3.0, 4.0];
pub const SNAP_DISTANCE: f32 = 0.1;
pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 4.0;
/// dpi that corresponds to a scale of 1.0
pub const BASE_DPI: f32 = 96.0;
const PLAUSIBLE_DPI: std::ops::RangeInclusive<f32> = 72.0..=300.0;
const MM_PER_INCH: f32 = 25.4;

/// Where a detected scale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleSource {
    Environment(&'static str),
    XftDpi,
    PhysicalDpi,
    Default,
}

/// snaps `scale` to the closest common scale if it is close enough, otherwise clamps it.
pub fn round_scale(scale: f32) -> f32 {
    let mut best = 1.0;
    let mut best_distance = f32::MAX;
    for common in COMMON_SCALES {
        let distance = (scale - common).abs();
        if distance < best_distance {
            best_distance = distance;
            best = common;
        }
    }
    if best_distance < SNAP_DISTANCE {
        best
    } else {
        scale.clamp(MIN_SCALE, MAX_SCALE)
    }
}

/// extracts the value of `Xft.dpi:` from an x resource manager string. 0.0 when the key is missing
/// or the value is not a positive number.
pub fn parse_xft_dpi(resources: &str) -> f32 {
    const KEY: &str = "Xft.dpi:";
    let Some(start) = resources.find(KEY) else {
        return 0.0;
    };
    let value = resources[start + KEY.len()..].trim_start_matches([' ', '\t']);
    let end = value
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(value.len(), |(i, _)| i);
    let mut number = &value[..end];
    // only the first decimal point counts
    if let Some(second) = number
        .char_indices()
        .filter(|(_, c)| *c == '.')
        .nth(1)
        .map(|(i, _)| i)
    {
        number = &number[..second];
    }
    let number = number.trim_end_matches('.');
    match number.parse::<f32>() {
        Ok(dpi) if dpi > 0.0 => dpi,
        _ => 0.0,
    }
}

/// a positive scale read from `var`, if any.
pub fn env_scale(lookup: impl Fn(&str) -> Option<String>, var: &str) -> Option<f32> {
    lookup(var)?
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|scale| scale.is_finite() && *scale > 0.0)
}

/// dpi from a screen width in pixels and millimeters, if it is plausible
pub fn physical_dpi(width_px: i32, width_mm: i32) -> Option<f32> {
    if width_px <= 0 || width_mm <= 0 {
        return None;
    }
    let dpi = width_px as f32 / width_mm as f32 * MM_PER_INCH;
    PLAUSIBLE_DPI.contains(&dpi).then_some(dpi)
}

/// Runs the detection chain over already gathered inputs.
///
/// `lookup` reads environment variables, `xft_resources` is the resource manager string if the
/// display has one and `physical` is the screen width as `(pixels, millimeters)`.
pub fn detect_scale(
    lookup: impl Fn(&str) -> Option<String>,
    xft_resources: Option<&str>,
    physical: Option<(i32, i32)>,
) -> (f32, ScaleSource) {
    for var in SCALE_ENV_VARS {
        if let Some(scale) = env_scale(&lookup, var) {
            return (round_scale(scale), ScaleSource::Environment(var));
        }
    }
    if let Some(resources) = xft_resources {
        let dpi = parse_xft_dpi(resources);
        if dpi > 0.0 {
            return (round_scale(dpi / BASE_DPI), ScaleSource::XftDpi);
        }
    }
    if let Some(dpi) = physical.and_then(|(px, mm)| physical_dpi(px, mm)) {
        return (round_scale(dpi / BASE_DPI), ScaleSource::PhysicalDpi);
    }
    (1.0, ScaleSource::Default)
}

/// [`detect_scale`] with the process environment.
pub fn detect_scale_from_env(
    xft_resources: Option<&str>,
    physical: Option<(i32, i32)>,
) -> (f32, ScaleSource) {
    detect_scale(|var| std::env::var(var).ok(), xft_resources, physical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn round_scale_is_idempotent_on_common_scales() {
        for common in COMMON_SCALES {
            assert_eq!(round_scale(common), common);
            assert_eq!(round_scale(round_scale(common)), common);
        }
    }

    #[test]
    fn round_scale_snaps_nearby_values() {
        assert_eq!(round_scale(1.04), 1.0);
        assert_eq!(round_scale(1.46), 1.5);
        assert_eq!(round_scale(1.958), 2.0);
        assert_eq!(round_scale(0.7), 0.75);
        assert_eq!(round_scale(3.95), 4.0);
    }

    #[test]
    fn round_scale_clamps_far_values() {
        assert_eq!(round_scale(0.2), MIN_SCALE);
        assert_eq!(round_scale(0.0), MIN_SCALE);
        assert_eq!(round_scale(9.0), MAX_SCALE);
        // between common values, unsnapped
        assert_relative_eq!(round_scale(2.25), 2.25);
        assert_relative_eq!(round_scale(3.5), 3.5);
    }

    #[test]
    fn xft_dpi() {
        assert_eq!(parse_xft_dpi("Xft.dpi:\t144\n"), 144.0);
        assert_eq!(
            parse_xft_dpi("Xft.antialias:\t1\nXft.dpi:\t144\nXft.hinting:\t1\n"),
            144.0
        );
        assert_relative_eq!(parse_xft_dpi("Xft.dpi: 120.5\n"), 120.5);
        assert_relative_eq!(parse_xft_dpi("Xft.dpi:96"), 96.0);
        assert_eq!(parse_xft_dpi("Xft.hinting:\t1\n"), 0.0);
        assert_eq!(parse_xft_dpi(""), 0.0);
        assert_eq!(parse_xft_dpi("Xft.dpi:\tabc\n"), 0.0);
        assert_eq!(parse_xft_dpi("Xft.dpi:\t0\n"), 0.0);
    }

    #[test]
    fn environment_has_priority_order() {
        let env = |var: &str| match var {
            "GDK_SCALE" => Some("2".to_string()),
            "QT_SCALE_FACTOR" => Some("1.5".to_string()),
            _ => None,
        };
        assert_eq!(
            detect_scale(env, Some("Xft.dpi:\t96\n"), None),
            (2.0, ScaleSource::Environment("GDK_SCALE"))
        );
        // zero and garbage are skipped
        let env = |var: &str| match var {
            "GTK_SCALE" => Some("0".to_string()),
            "GDK_SCALE" => Some("big".to_string()),
            "QT_SCALE_FACTOR" => Some("1.26".to_string()),
            _ => None,
        };
        assert_eq!(
            detect_scale(env, None, None),
            (1.25, ScaleSource::Environment("QT_SCALE_FACTOR"))
        );
    }

    #[test]
    fn xft_then_physical_then_default() {
        assert_eq!(
            detect_scale(no_env, Some("Xft.dpi:\t144\n"), Some((1920, 508))),
            (1.5, ScaleSource::XftDpi)
        );
        // 3840 px over 600 mm is ~162 dpi
        let (scale, source) = detect_scale(no_env, Some("Xft.hinting:\t1\n"), Some((3840, 600)));
        assert_eq!(source, ScaleSource::PhysicalDpi);
        assert_eq!(scale, 1.75);
        // 1920 px over 100 mm is ~487 dpi, rejected
        assert_eq!(
            detect_scale(no_env, None, Some((1920, 100))),
            (1.0, ScaleSource::Default)
        );
        assert_eq!(detect_scale(no_env, None, Some((1920, 0))), (1.0, ScaleSource::Default));
    }
}
