pub mod search;
pub mod timeline;
