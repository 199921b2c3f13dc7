pub mod dashboard;
pub mod spreadsheet;
