pub mod conn;
pub mod context;
pub mod cursors;
