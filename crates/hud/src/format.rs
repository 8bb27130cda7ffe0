//! Text helpers for the info panel

use std::collections::BTreeMap;

/// Frames covered by the collision sparkline
pub const SPARKLINE_FRAMES: u64 = 200;

/// Compass letters for a yaw in degrees
///
/// Bounds are open, so a yaw sitting exactly on a threshold (e.g. 90.0)
/// contributes neither of the letters around it.
pub fn heading_letters(yaw: f64) -> String {
    let mut heading = String::with_capacity(2);
    if yaw.abs() < 89.5 {
        heading.push('N');
    }
    if yaw.abs() > 90.5 {
        heading.push('S');
    }
    if 0.5 < yaw && yaw < 179.5 {
        heading.push('E');
    }
    if -179.5 < yaw && yaw < -0.5 {
        heading.push('W');
    }
    heading
}

/// Whole seconds as `H:MM:SS`, with a leading day count past 24 hours
pub fn format_sim_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let days = total / 86_400;
    let rem = total % 86_400;
    let hms = format!("{}:{:02}:{:02}", rem / 3600, (rem % 3600) / 60, rem % 60);
    match days {
        0 => hms,
        1 => format!("1 day, {hms}"),
        d => format!("{d} days, {hms}"),
    }
}

/// Fixed-point number with a blank sign slot, right aligned to `width`
///
/// `fmt_signed(3.0, 6, 1)` is `"   3.0"`, `fmt_signed(-3.0, 6, 1)` is `"  -3.0"`.
pub fn fmt_signed(value: f64, width: usize, precision: usize) -> String {
    let digits = format!("{value:.precision$}");
    let signed = if digits.starts_with('-') {
        digits
    } else {
        format!(" {digits}")
    };
    format!("{signed:>width$}")
}

/// Integer with a blank sign slot, right aligned to `width`
pub fn fmt_signed_int(value: i64, width: usize) -> String {
    let signed = if value < 0 {
        value.to_string()
    } else {
        format!(" {value}")
    };
    format!("{signed:>width$}")
}

/// Normalised collision intensities for the frames before `frame`
///
/// Bucket `i` holds the summed magnitude of frame `frame - 200 + i` (zero when
/// nothing was recorded), divided by `max(1.0, largest bucket)`.
pub fn collision_sparkline(history: &BTreeMap<u64, f64>, frame: u64) -> Vec<f64> {
    let buckets: Vec<f64> = (0..SPARKLINE_FRAMES)
        .map(|x| {
            (frame + x)
                .checked_sub(SPARKLINE_FRAMES)
                .and_then(|f| history.get(&f))
                .copied()
                .unwrap_or(0.0)
        })
        .collect();
    let max = buckets.iter().copied().fold(1.0_f64, f64::max);
    buckets.into_iter().map(|v| v / max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_thresholds() {
        assert_eq!(heading_letters(0.0), "N");
        assert_eq!(heading_letters(45.0), "NE");
        assert_eq!(heading_letters(-45.0), "NW");
        assert_eq!(heading_letters(135.0), "SE");
        assert_eq!(heading_letters(-135.0), "SW");
        assert_eq!(heading_letters(180.0), "S");
        assert_eq!(heading_letters(0.5), "N");
        assert_eq!(heading_letters(89.5), "E");
    }

    #[test]
    fn test_heading_on_boundary_has_no_axis_letter() {
        let h = heading_letters(90.0);
        assert!(!h.contains('N') && !h.contains('S'));
        assert_eq!(h, "E");
        assert_eq!(heading_letters(-90.0), "W");
    }

    #[test]
    fn test_format_sim_time() {
        assert_eq!(format_sim_time(0.0), "0:00:00");
        assert_eq!(format_sim_time(59.9), "0:00:59");
        assert_eq!(format_sim_time(3725.0), "1:02:05");
        assert_eq!(format_sim_time(86_400.0 + 61.0), "1 day, 0:01:01");
        assert_eq!(format_sim_time(2.0 * 86_400.0), "2 days, 0:00:00");
    }

    #[test]
    fn test_fmt_signed() {
        assert_eq!(fmt_signed(3.0, 6, 1), "   3.0");
        assert_eq!(fmt_signed(-3.0, 6, 1), "  -3.0");
        assert_eq!(fmt_signed(12.6, 4, 0), "  13");
        assert_eq!(fmt_signed(123456.0, 3, 0), " 123456");
        assert_eq!(fmt_signed_int(42, 4), "  42");
        assert_eq!(fmt_signed_int(-7, 4), "  -7");
    }

    #[test]
    fn test_sparkline_normalised() {
        let history = BTreeMap::from([(150, 2.0), (180, 8.0), (250, 100.0)]);
        let line = collision_sparkline(&history, 200);

        assert_eq!(line.len(), 200);
        assert!(line.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(line[180], 1.0);
        assert_eq!(line[150], 0.25);
    }

    #[test]
    fn test_sparkline_small_values_not_stretched() {
        let history = BTreeMap::from([(10, 0.5)]);
        let line = collision_sparkline(&history, 100);
        assert_eq!(line[110], 0.5);
    }

    #[test]
    fn test_sparkline_all_zero() {
        let line = collision_sparkline(&BTreeMap::new(), 5);
        assert!(line.iter().all(|&v| v == 0.0));
    }
}
