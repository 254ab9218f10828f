//! Human-readable clock formatting for report views
//!
//! Playheads, chart ticks and transcript timestamps all use the same
//! `mm:ss.s` shape so that the numbers line up across panels.

/// Format seconds as `mm:ss.s`.
///
/// Rounds to the nearest tenth first so that 7.96s renders as `00:08.0`
/// rather than carrying a stale seconds digit. Negative and non-finite
/// values render as zero; minutes are not wrapped into hours.
///
/// # Examples
///
/// ```
/// use mirp_common::human_time::format_clock;
///
/// assert_eq!(format_clock(0.0), "00:00.0");
/// assert_eq!(format_clock(7.5), "00:07.5");
/// assert_eq!(format_clock(125.04), "02:05.0");
/// assert_eq!(format_clock(7.96), "00:08.0");
/// ```
pub fn format_clock(seconds: f64) -> String {
    let secs = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };

    let tenths = (secs * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rem = tenths % 600;
    format!("{:02}:{:02}.{}", minutes, rem / 10, rem % 10)
}

/// Format the `current / total` playhead label shown under the player
///
/// # Examples
///
/// ```
/// use mirp_common::human_time::format_playhead;
///
/// assert_eq!(format_playhead(61.2, 120.0), "01:01.2 / 02:00.0");
/// ```
pub fn format_playhead(current: f64, total: f64) -> String {
    format!("{} / {}", format_clock(current), format_clock(total))
}

/// Format a score with exactly one decimal, as displayed on the score badge
pub fn format_score(score: f64) -> String {
    let s = if score.is_finite() { score } else { 0.0 };
    format!("{:.1}", s)
}
