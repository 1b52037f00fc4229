pub mod commands;
pub mod dates;
pub mod handlers;
pub mod output;
