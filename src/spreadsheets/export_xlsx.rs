use crate::domain::lead::Lead;
use crate::errors::ServerError;
use crate::spreadsheets::export_csv::{export_fields, export_header};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// Budget columns, written as numbers rather than text.
const BUDGET_COLUMNS: [usize; 2] = [7, 8];

fn xlsx_err(what: &str) -> impl Fn(XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

/// Builds a one-sheet workbook with the same columns as the CSV export.
pub fn leads_to_xlsx(leads: &[Lead]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Leads")
        .map_err(xlsx_err("sheet name"))?;

    let bold = Format::new().set_bold();
    for (col, header) in export_header().iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_err(header))?;
    }

    for (i, lead) in leads.iter().enumerate() {
        let r = (i + 1) as u32;
        let budgets = [lead.fields.budget_min, lead.fields.budget_max];

        for (col, value) in export_fields(lead).iter().enumerate() {
            let c = col as u16;
            match BUDGET_COLUMNS.iter().position(|&b| b == col) {
                Some(idx) => {
                    if let Some(n) = budgets[idx] {
                        worksheet
                            .write_number(r, c, n as f64)
                            .map_err(xlsx_err("budget"))?;
                    }
                }
                None => {
                    worksheet
                        .write_string(r, c, value)
                        .map_err(xlsx_err("cell"))?;
                }
            }
        }
    }

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}
