use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Checkbox state of a checklist line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkbox {
    Unchecked,
    Checked,
}

impl Checkbox {
    /// The character used inside the checkbox `[ ]`
    pub fn checkbox_char(self) -> char {
        match self {
            Checkbox::Unchecked => ' ',
            Checkbox::Checked => 'x',
        }
    }

    /// Parse a checkbox character into a state
    pub fn from_checkbox_char(c: char) -> Option<Checkbox> {
        match c {
            ' ' => Some(Checkbox::Unchecked),
            'x' => Some(Checkbox::Checked),
            _ => None,
        }
    }

    pub fn is_checked(self) -> bool {
        self == Checkbox::Checked
    }
}

/// A single todo.
///
/// Identity is the `id`, assigned on creation and never persisted. Moving an
/// item between the active set and a completed day creates a new item rather
/// than flipping `is_completed` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: Uuid,
    pub title: String,
    pub is_completed: bool,
    /// Scheduled day for active items, completion day for completed ones
    pub date: NaiveDate,
}

impl TodoItem {
    /// Create a new unchecked item scheduled for `date`
    pub fn active(title: impl Into<String>, date: NaiveDate) -> Self {
        TodoItem {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: false,
            date,
        }
    }

    /// Create a new checked item in the bucket for `date`
    pub fn completed(title: impl Into<String>, date: NaiveDate) -> Self {
        TodoItem {
            id: Uuid::new_v4(),
            title: title.into(),
            is_completed: true,
            date,
        }
    }

    pub fn checkbox(&self) -> Checkbox {
        if self.is_completed {
            Checkbox::Checked
        } else {
            Checkbox::Unchecked
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn checkbox_chars() {
        assert_eq!(Checkbox::from_checkbox_char(' '), Some(Checkbox::Unchecked));
        assert_eq!(Checkbox::from_checkbox_char('x'), Some(Checkbox::Checked));
        assert_eq!(Checkbox::from_checkbox_char('>'), None);
        assert_eq!(Checkbox::Checked.checkbox_char(), 'x');
    }

    #[test]
    fn new_items_get_distinct_ids() {
        let a = TodoItem::active("Write report", day("2025-06-15"));
        let b = TodoItem::active("Write report", day("2025-06-15"));
        assert_ne!(a.id, b.id);
        assert!(!a.is_completed);
        assert_eq!(a.checkbox(), Checkbox::Unchecked);
    }

    #[test]
    fn completed_constructor() {
        let item = TodoItem::completed("Ship it", day("2025-06-14"));
        assert!(item.is_completed);
        assert_eq!(item.checkbox(), Checkbox::Checked);
        assert_eq!(item.date, day("2025-06-14"));
    }
}
