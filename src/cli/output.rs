use chrono::NaiveDate;
use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::todo::TodoItem;
use crate::ops::search::{Bucket, SearchHit};
use crate::ops::timeline::DayTodos;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TodoJson {
    pub number: usize,
    pub title: String,
    pub completed: bool,
    pub date: NaiveDate,
}

#[derive(Serialize)]
pub struct DayJson {
    pub date: NaiveDate,
    pub today: bool,
    pub active: Vec<TodoJson>,
    pub completed: Vec<TodoJson>,
}

#[derive(Serialize)]
pub struct TimelineDayJson {
    pub date: NaiveDate,
    pub today: bool,
    pub active: usize,
    pub completed: usize,
}

#[derive(Serialize)]
pub struct SearchHitJson {
    /// `"active"` or the completed day
    pub bucket: String,
    pub title: String,
}

#[derive(Serialize)]
pub struct FolderJson {
    pub folder: String,
    pub fell_back: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn todo_to_json(number: usize, item: &TodoItem) -> TodoJson {
    TodoJson {
        number,
        title: item.title.clone(),
        completed: item.is_completed,
        date: item.date,
    }
}

pub fn day_to_json(day: NaiveDate, today: NaiveDate, todos: &DayTodos<'_>) -> DayJson {
    DayJson {
        date: day,
        today: day == today,
        active: todos
            .active
            .iter()
            .enumerate()
            .map(|(i, t)| todo_to_json(i + 1, t))
            .collect(),
        completed: todos
            .completed
            .iter()
            .enumerate()
            .map(|(i, t)| todo_to_json(i + 1, t))
            .collect(),
    }
}

pub fn search_hit_to_json(hit: &SearchHit<'_>) -> SearchHitJson {
    SearchHitJson {
        bucket: bucket_label(hit.bucket),
        title: hit.item.title.clone(),
    }
}

fn bucket_label(bucket: Bucket) -> String {
    match bucket {
        Bucket::Active => "active".to_string(),
        Bucket::Completed(day) => day.format("%Y-%m-%d").to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text output
// ---------------------------------------------------------------------------

/// `[ ] title` / `[x] title`
fn checkbox_entry(item: &TodoItem) -> String {
    format!("[{}] {}", item.checkbox().checkbox_char(), item.title)
}

/// Heading for a day, e.g. `Sun 2025-06-15 (today)`
pub fn day_heading(day: NaiveDate, today: NaiveDate) -> String {
    let mut heading = day.format("%a %Y-%m-%d").to_string();
    let delta = (day - today).num_days();
    match delta {
        0 => heading.push_str(" (today)"),
        1 => heading.push_str(" (tomorrow)"),
        -1 => heading.push_str(" (yesterday)"),
        _ => {}
    }
    heading
}

/// Render one day's todos with the numbers used by `done`, `undo` and `rm`.
pub fn render_day(day: NaiveDate, today: NaiveDate, todos: &DayTodos<'_>) -> String {
    let mut out = day_heading(day, today);
    out.push('\n');

    if todos.active.is_empty() && todos.completed.is_empty() {
        out.push_str("\nNothing here.\n");
        return out;
    }

    if !todos.active.is_empty() {
        out.push_str("\nTo do:\n");
        for (i, item) in todos.active.iter().enumerate() {
            let mut line = format!("  {}. {}", i + 1, checkbox_entry(item));
            if item.date < day {
                line.push_str(&format!("  (from {})", item.date.format("%Y-%m-%d")));
            }
            out.push_str(&line);
            out.push('\n');
        }
    }

    if !todos.completed.is_empty() {
        out.push_str("\nDone:\n");
        for (i, item) in todos.completed.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, checkbox_entry(item)));
        }
    }

    out
}

/// One timeline row: `2025-06-15 Sun  2 to do, 1 done  (today)`
pub fn render_timeline_row(day: NaiveDate, today: NaiveDate, active: usize, completed: usize) -> String {
    let mut row = format!(
        "{}  {} to do, {} done",
        day.format("%Y-%m-%d %a"),
        active,
        completed
    );
    if day == today {
        row.push_str("  (today)");
    }
    row
}

pub fn render_search_hit(hit: &SearchHit<'_>) -> String {
    format!("{:<10}  {}", bucket_label(hit.bucket), checkbox_entry(hit.item))
}

pub fn render_recovery_entry(entry: &RecoveryEntry) -> String {
    entry.to_markdown()
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn render_day_with_items() {
        let today = day("2025-06-15");
        let overdue = TodoItem::active("Pay rent", day("2025-06-10"));
        let fresh = TodoItem::active("Write report", today);
        let done = vec![TodoItem::completed("Ship it", today)];
        let todos = DayTodos {
            active: vec![&overdue, &fresh],
            completed: &done,
        };

        assert_snapshot!(render_day(today, today, &todos), @r"
        Sun 2025-06-15 (today)

        To do:
          1. [ ] Pay rent  (from 2025-06-10)
          2. [ ] Write report

        Done:
          1. [x] Ship it
        ");
    }

    #[test]
    fn render_empty_day() {
        let todos = DayTodos {
            active: Vec::new(),
            completed: &[],
        };
        let out = render_day(day("2025-06-20"), day("2025-06-15"), &todos);
        assert_eq!(out, "Fri 2025-06-20\n\nNothing here.\n");
    }

    #[test]
    fn headings_name_nearby_days() {
        let today = day("2025-06-15");
        assert_eq!(day_heading(day("2025-06-16"), today), "Mon 2025-06-16 (tomorrow)");
        assert_eq!(day_heading(day("2025-06-14"), today), "Sat 2025-06-14 (yesterday)");
        assert_eq!(day_heading(day("2025-06-01"), today), "Sun 2025-06-01");
    }

    #[test]
    fn timeline_row() {
        let today = day("2025-06-15");
        assert_eq!(
            render_timeline_row(today, today, 2, 1),
            "2025-06-15 Sun  2 to do, 1 done  (today)"
        );
    }

    #[test]
    fn day_json_numbers_items() {
        let today = day("2025-06-15");
        let a = TodoItem::active("A", today);
        let done = vec![TodoItem::completed("B", today)];
        let todos = DayTodos {
            active: vec![&a],
            completed: &done,
        };
        let json = serde_json::to_value(day_to_json(today, today, &todos)).unwrap();
        assert_eq!(json["date"], "2025-06-15");
        assert_eq!(json["today"], true);
        assert_eq!(json["active"][0]["number"], 1);
        assert_eq!(json["completed"][0]["title"], "B");
        assert_eq!(json["completed"][0]["completed"], true);
    }
}
