pub mod checklist_parser;
pub mod checklist_serializer;
pub mod day_file;

pub use checklist_parser::{ParsedChecklist, parse_checklist, parse_checklist_line};
pub use checklist_serializer::{serialize_checklist, serialize_item};
pub use day_file::{day_file_name, parse_day_file_name};
