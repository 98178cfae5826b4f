use crate::domain::changes::HistoryEntry;
use crate::domain::lead::Lead;
use crate::templates::{card, desktop_layout};
use maud::{html, Markup};
use serde_json::Value;

fn show(v: &Value) -> String {
    match v {
        Value::Null => "—".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

pub fn lead_detail_page(email: &str, lead: &Lead, history: &[HistoryEntry]) -> Markup {
    let f = &lead.fields;
    let rows: Vec<(&str, String)> = vec![
        ("Email", f.email.clone().unwrap_or_default()),
        ("Phone", f.phone.clone()),
        ("City", f.city.to_string()),
        ("Property type", f.property_type.to_string()),
        ("BHK", f.bhk.map(|b| b.to_string()).unwrap_or_default()),
        ("Purpose", f.purpose.to_string()),
        ("Budget min", f.budget_min.map(|n| n.to_string()).unwrap_or_default()),
        ("Budget max", f.budget_max.map(|n| n.to_string()).unwrap_or_default()),
        ("Timeline", f.timeline.to_string()),
        ("Source", f.source.to_string()),
        ("Status", lead.status.to_string()),
        ("Tags", f.tags.join(", ")),
        ("Notes", f.notes.clone().unwrap_or_default()),
    ];

    desktop_layout(
        &f.full_name,
        Some(email),
        html! {
            main class="container" {
                p { a href="/leads" { "← All leads" } }
                h1 { (f.full_name) }
                p class="actions" {
                    a href={ "/leads/" (lead.id) "/edit" } class="button" { "Edit" }
                    form method="post" action={ "/leads/" (lead.id) "/delete" } class="inline" {
                        button type="submit" class="danger" { "Delete" }
                    }
                }
                p class="muted" {
                    "Created " (lead.created_at.format("%Y-%m-%d %H:%M"))
                    " · updated " (lead.updated_at.format("%Y-%m-%d %H:%M"))
                }

                dl {
                    @for (label, value) in &rows {
                        dt { (label) }
                        dd { (value) }
                    }
                }

                (card("Recent changes", html! {
                    @if history.is_empty() {
                        p { "No changes recorded." }
                    }
                    @for entry in history {
                        div class="history-entry" {
                            p class="muted" { (entry.changed_at.format("%Y-%m-%d %H:%M:%S")) }
                            ul {
                                @for (field, change) in &entry.diff {
                                    li {
                                        strong { (field) } ": "
                                        (show(&change.old)) " → " (show(&change.new))
                                    }
                                }
                            }
                        }
                    }
                }))
            }
        },
    )
}
