pub mod changes;
pub mod csv_row;
pub mod lead;
pub mod validation;
