use chrono::{Duration, NaiveDate, TimeDelta};

/// Parse a day argument relative to `today`.
///
/// Accepts `YYYY-MM-DD`, `today`, `tomorrow`, `yesterday`, and signed day
/// offsets like `+3` or `-1`.
pub fn parse_day_arg(arg: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let arg = arg.trim();
    match arg.to_ascii_lowercase().as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }

    if arg.starts_with('+') || arg.starts_with('-') {
        let offset: i64 = arg
            .parse()
            .map_err(|_| format!("invalid day offset '{}'", arg))?;
        return TimeDelta::try_days(offset)
            .and_then(|delta| today.checked_add_signed(delta))
            .ok_or_else(|| format!("day offset '{}' is out of range", arg));
    }

    NaiveDate::parse_from_str(arg, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD)", arg))
}

/// Parse an optional day argument, defaulting to `today`.
pub fn day_or_today(arg: Option<&str>, today: NaiveDate) -> Result<NaiveDate, String> {
    match arg {
        Some(a) => parse_day_arg(a, today),
        None => Ok(today),
    }
}
