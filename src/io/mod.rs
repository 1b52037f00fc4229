pub mod folder;
pub mod recovery;
pub mod settings_io;
pub mod store;
pub mod watcher;
