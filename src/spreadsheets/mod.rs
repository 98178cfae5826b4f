pub mod export_csv;
pub mod export_xlsx;
pub mod import_csv;

pub use export_csv::leads_to_csv;
pub use export_xlsx::leads_to_xlsx;
pub use import_csv::read_csv_rows;
