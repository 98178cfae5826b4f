use crate::domain::lead::TextEnum;
use maud::{html, Markup};
use url::form_urlencoded;

pub mod card;
pub mod error;

pub use card::card;
pub use error::html_error_response;

/// Every text value of a closed enum, in declaration order.
pub fn enum_texts<T: TextEnum>() -> Vec<&'static str> {
    T::variants().iter().map(|v| v.text()).collect()
}

/// A `<select>` over a closed set of values, with an "any" entry first.
pub fn filter_select(name: &str, label: &str, options: &[&str], selected: Option<&str>) -> Markup {
    html! {
        label {
            (label)
            select name=(name) {
                option value="" { "Any" }
                @for opt in options {
                    option value=(opt) selected[selected == Some(*opt)] { (opt) }
                }
            }
        }
    }
}

/// Previous/next links that keep every other query parameter.
pub fn pagination(base: &str, query: &[(String, String)], page: u32, total_pages: u64) -> Markup {
    let link = |target: u32| {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        for (k, v) in query.iter().filter(|(k, _)| k != "page") {
            qs.append_pair(k, v);
        }
        qs.append_pair("page", &target.to_string());
        format!("{base}?{}", qs.finish())
    };

    html! {
        nav class="pagination" {
            @if page > 1 {
                a href=(link(page - 1)) { "← Previous" }
            }
            span { "Page " (page) " of " (total_pages.max(1)) }
            @if u64::from(page) < total_pages {
                a href=(link(page + 1)) { "Next →" }
            }
        }
    }
}
