/// Format seconds as `m:ss.f` with `precision` fractional digits.
///
/// Digits are truncated, never rounded up, so the display never runs ahead
/// of the timer. Minutes are not wrapped into hours.
pub fn format_time(seconds: f64, precision: usize) -> String {
    let precision = precision.min(6);
    let scale = 10u64.pow(precision as u32);
    let seconds = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    // The epsilon absorbs representation error such as 4.35 * 100 = 434.999...
    let units = (seconds * scale as f64 + 1e-9).floor() as u64;

    let whole = units / scale;
    let minutes = whole / 60;
    let secs = whole % 60;
    if precision == 0 {
        format!("{}:{:02}", minutes, secs)
    } else {
        format!(
            "{}:{:02}.{:0width$}",
            minutes,
            secs,
            units % scale,
            width = precision
        )
    }
}
