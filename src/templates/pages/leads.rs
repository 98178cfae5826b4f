use crate::db::lead_query::{LeadFilter, LeadPage, SortKey, SortOrder};
use crate::domain::lead::{City, Lead, LeadStatus, PropertyType, Timeline};
use crate::templates::components::{enum_texts, filter_select, pagination};
use crate::templates::desktop_layout;
use maud::{html, Markup};

fn budget(lead: &Lead) -> String {
    match (lead.fields.budget_min, lead.fields.budget_max) {
        (Some(min), Some(max)) => format!("₹{min} – ₹{max}"),
        (Some(min), None) => format!("from ₹{min}"),
        (None, Some(max)) => format!("up to ₹{max}"),
        (None, None) => "—".to_string(),
    }
}

pub struct LeadsVm<'a> {
    pub email: &'a str,
    pub filter: &'a LeadFilter,
    pub page: &'a LeadPage,
    /// Raw query pairs, carried over into pagination links.
    pub query: &'a [(String, String)],
}

pub fn leads_page(vm: &LeadsVm<'_>) -> Markup {
    let f = vm.filter;
    let sort_keys = [
        SortKey::UpdatedAt,
        SortKey::CreatedAt,
        SortKey::FullName,
        SortKey::BudgetMin,
        SortKey::BudgetMax,
    ];

    desktop_layout(
        "Leads",
        Some(vm.email),
        html! {
            main class="container" {
                h1 { "Leads" }
                p class="actions" {
                    a href="/leads/new" class="button" { "New lead" }
                    " "
                    a href="/leads/import" class="button" { "Import CSV" }
                }

                form method="get" action="/leads" class="filters" {
                    input type="search" name="search" placeholder="Name, phone or email"
                        value=(f.search.as_deref().unwrap_or_default());
                    (filter_select("city", "City", &enum_texts::<City>(), f.city.map(|v| v.as_str())))
                    (filter_select("propertyType", "Property", &enum_texts::<PropertyType>(), f.property_type.map(|v| v.as_str())))
                    (filter_select("status", "Status", &enum_texts::<LeadStatus>(), f.status.map(|v| v.as_str())))
                    (filter_select("timeline", "Timeline", &enum_texts::<Timeline>(), f.timeline.map(|v| v.as_str())))
                    label {
                        "Sort"
                        select name="sortBy" {
                            @for key in sort_keys {
                                option value=(key.as_str()) selected[f.sort_by == key] { (key.as_str()) }
                            }
                        }
                        select name="sortOrder" {
                            option value="desc" selected[f.sort_order == SortOrder::Desc] { "desc" }
                            option value="asc" selected[f.sort_order == SortOrder::Asc] { "asc" }
                        }
                    }
                    button type="submit" { "Apply" }
                }

                p class="muted" { (vm.page.total_count) " leads" }

                @if vm.page.items.is_empty() {
                    p { "No leads match these filters." }
                } @else {
                    table {
                        thead {
                            tr {
                                th { "Name" } th { "Phone" } th { "City" } th { "Property" }
                                th { "Budget" } th { "Timeline" } th { "Status" } th { "Updated" }
                            }
                        }
                        tbody {
                            @for lead in &vm.page.items {
                                tr {
                                    td { a href={ "/leads/" (lead.id) } { (lead.fields.full_name) } }
                                    td { (lead.fields.phone) }
                                    td { (lead.fields.city) }
                                    td {
                                        (lead.fields.property_type)
                                        @if let Some(bhk) = lead.fields.bhk { " · " (bhk) " BHK" }
                                    }
                                    td { (budget(lead)) }
                                    td { (lead.fields.timeline) }
                                    td { (lead.status) }
                                    td { (lead.updated_at.format("%Y-%m-%d %H:%M")) }
                                }
                            }
                        }
                    }
                }

                (pagination("/leads", vm.query, vm.page.current_page, vm.page.total_pages))
            }
        },
    )
}
