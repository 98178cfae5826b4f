use crate::domain::csv_row::{RowError, CSV_COLUMNS, MAX_BATCH_ROWS};
use crate::templates::{card, desktop_layout};
use maud::{html, Markup};

/// What a finished (or refused) import looked like.
pub enum ImportResult<'a> {
    Imported { count: usize, errors: &'a [RowError] },
    Rejected { message: &'a str, errors: &'a [RowError] },
}

fn row_errors(errors: &[RowError]) -> Markup {
    html! {
        @if !errors.is_empty() {
            table class="row-errors" {
                thead { tr { th { "Row" } th { "Problem" } } }
                tbody {
                    @for e in errors {
                        tr { td { (e.row) } td { (e.message) } }
                    }
                }
            }
        }
    }
}

pub fn import_page(email: &str, result: Option<&ImportResult<'_>>, csv: &str) -> Markup {
    desktop_layout(
        "Import leads",
        Some(email),
        html! {
            main class="container narrow" {
                p { a href="/leads" { "← All leads" } }
                h1 { "Import leads" }

                @match result {
                    Some(ImportResult::Imported { count, errors }) => {
                        (card("Import finished", html! {
                            p { "Imported " (count) " leads." }
                            @if !errors.is_empty() {
                                p { (errors.len()) " rows were skipped:" }
                            }
                            (row_errors(errors))
                        }))
                    }
                    Some(ImportResult::Rejected { message, errors }) => {
                        p class="error" role="alert" { (message) }
                        (row_errors(errors))
                    }
                    None => {}
                }

                p class="muted" {
                    "Paste CSV with a header line. Up to " (MAX_BATCH_ROWS) " rows; columns: "
                    code { (CSV_COLUMNS.join(",")) }
                }
                form method="post" action="/leads/import" {
                    textarea name="csv" rows="14" required { (csv) }
                    button type="submit" class="primary" { "Import" }
                }
            }
        },
    )
}
