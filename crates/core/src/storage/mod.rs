pub mod csv_export;
pub mod format;
pub mod session;
