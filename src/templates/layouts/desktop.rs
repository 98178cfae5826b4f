use maud::{html, Markup, DOCTYPE};

pub fn desktop_layout(title: &str, signed_in_as: Option<&str>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Buyer Leads" }
                link rel="stylesheet" href="/static/main.css";
            }
            body {
                header class="flex items-center justify-between px-6 py-3 shadow" {
                    h3 { a href="/leads" { "Buyer Leads" } }
                    @match signed_in_as {
                        Some(email) => {
                            nav {
                                ul {
                                    li { a href="/leads" { "Leads" } }
                                    li { a href="/leads/new" { "New lead" } }
                                    li { a href="/leads/import" { "Import" } }
                                    li { a href="/api/leads/export" { "Export CSV" } }
                                    li { a href="/api/leads/export.xlsx" { "Export XLSX" } }
                                }
                            }
                            form method="post" action="/auth/signout" class="inline" {
                                span class="muted" { (email) " " }
                                button type="submit" { "Sign out" }
                            }
                        }
                        None => {
                            a href="/signin" class="text-base font-medium hover:text-blue-600" { "Sign in" }
                        }
                    }
                }
                (content)
            }
        }
    }
}
