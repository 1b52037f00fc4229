use chrono::NaiveDate;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// File name for a day's completed items: `YYYY-MM-DD.md`
pub fn day_file_name(day: NaiveDate) -> String {
    format!("{}.md", day.format(DAY_FORMAT))
}

/// Parse a completed-day file name back into its date.
/// Returns `None` for anything that is not exactly `YYYY-MM-DD.md`.
pub fn parse_day_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_suffix(".md")?;
    // chrono accepts unpadded fields; the file name must be the padded form
    if stem.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(stem, DAY_FORMAT).ok()
}
