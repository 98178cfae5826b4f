use crate::domain::lead::{Bhk, City, LeadStatus, PropertyType, Purpose, Source, TextEnum, Timeline};
use crate::domain::validation::FieldErrors;
use crate::templates::components::enum_texts;
use crate::templates::desktop_layout;
use maud::{html, Markup};
use std::collections::HashMap;

/// Create or edit form. `values` holds what the user last submitted (or the
/// stored lead), keyed by the JSON field names.
pub struct LeadFormVm<'a> {
    pub email: &'a str,
    pub title: &'a str,
    pub action: &'a str,
    pub values: &'a HashMap<String, String>,
    pub errors: Option<&'a FieldErrors>,
    /// Shown above the form, e.g. when someone else saved first.
    pub notice: Option<&'a str>,
    /// Edit mode: status select plus the hidden `updatedAt` token.
    pub editing: bool,
}

impl LeadFormVm<'_> {
    fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    fn error(&self, name: &str) -> Option<&str> {
        self.errors.and_then(|e| e.get(name))
    }
}

fn field_error(vm: &LeadFormVm<'_>, name: &str) -> Markup {
    html! {
        @if let Some(msg) = vm.error(name) {
            small class="error" { (msg) }
        }
    }
}

fn text_input(vm: &LeadFormVm<'_>, name: &str, label: &str, kind: &str) -> Markup {
    html! {
        label {
            (label)
            input type=(kind) name=(name) value=(vm.value(name))
                aria-invalid=[vm.error(name).map(|_| "true")];
            (field_error(vm, name))
        }
    }
}

fn enum_select<T: TextEnum>(vm: &LeadFormVm<'_>, name: &str, label: &str, blank: bool) -> Markup {
    let current = vm.value(name);
    html! {
        label {
            (label)
            select name=(name) {
                @if blank {
                    option value="" { "—" }
                }
                @for opt in enum_texts::<T>() {
                    option value=(opt) selected[current == opt] { (opt) }
                }
            }
            (field_error(vm, name))
        }
    }
}

pub fn lead_form_page(vm: &LeadFormVm<'_>) -> Markup {
    desktop_layout(
        vm.title,
        Some(vm.email),
        html! {
            main class="container narrow" {
                p { a href="/leads" { "← All leads" } }
                h1 { (vm.title) }

                @if let Some(notice) = vm.notice {
                    p class="error" role="alert" { (notice) }
                }
                @if vm.errors.is_some_and(|e| !e.is_empty()) {
                    p class="error" role="alert" { "Please fix the highlighted fields." }
                }

                form method="post" action=(vm.action) class="lead-form" {
                    @if vm.editing {
                        input type="hidden" name="updatedAt" value=(vm.value("updatedAt"));
                    }
                    (text_input(vm, "fullName", "Full name", "text"))
                    (text_input(vm, "email", "Email", "email"))
                    (text_input(vm, "phone", "Phone", "tel"))
                    (enum_select::<City>(vm, "city", "City", false))
                    (enum_select::<PropertyType>(vm, "propertyType", "Property type", false))
                    (enum_select::<Bhk>(vm, "bhk", "BHK (Apartment and Villa)", true))
                    (enum_select::<Purpose>(vm, "purpose", "Purpose", false))
                    (text_input(vm, "budgetMin", "Budget min (₹)", "number"))
                    (text_input(vm, "budgetMax", "Budget max (₹)", "number"))
                    (enum_select::<Timeline>(vm, "timeline", "Timeline", false))
                    (enum_select::<Source>(vm, "source", "Source", false))
                    @if vm.editing {
                        (enum_select::<LeadStatus>(vm, "status", "Status", false))
                    }
                    (text_input(vm, "tags", "Tags (comma separated)", "text"))
                    label {
                        "Notes"
                        textarea name="notes" rows="4" { (vm.value("notes")) }
                        (field_error(vm, "notes"))
                    }
                    (field_error(vm, "updatedAt"))
                    button type="submit" class="primary" { "Save" }
                }
            }
        },
    )
}
