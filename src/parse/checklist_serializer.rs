use crate::model::todo::TodoItem;

/// Format one item as a checklist line
pub fn serialize_item(item: &TodoItem) -> String {
    format!("- [{}] {}", item.checkbox().checkbox_char(), item.title)
}

/// Serialize items one per line, newline-joined with no trailing newline.
pub fn serialize_checklist(items: &[TodoItem]) -> String {
    items
        .iter()
        .map(serialize_item)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::todo::Checkbox;
    use crate::parse::checklist_parser::parse_checklist;
    use chrono::NaiveDate;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    #[test]
    fn serializes_active_items() {
        let items = vec![TodoItem::active("One", day()), TodoItem::active("Two", day())];
        assert_eq!(serialize_checklist(&items), "- [ ] One\n- [ ] Two");
    }

    #[test]
    fn serializes_completed_items() {
        let items = vec![TodoItem::completed("Done", day())];
        assert_eq!(serialize_checklist(&items), "- [x] Done");
    }

    #[test]
    fn empty_list_is_empty_string() {
        assert_eq!(serialize_checklist(&[]), "");
    }

    #[test]
    fn round_trip_preserves_order() {
        let items = vec![
            TodoItem::completed("b", day()),
            TodoItem::completed("a", day()),
            TodoItem::completed("c", day()),
        ];
        let parsed = parse_checklist(&serialize_checklist(&items), Checkbox::Checked);
        assert_eq!(parsed.titles, vec!["b", "a", "c"]);
        assert!(parsed.dropped.is_empty());
    }
}
