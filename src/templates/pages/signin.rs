use crate::templates::desktop_layout;
use maud::{html, Markup};

pub fn signin_page(error: Option<&str>) -> Markup {
    desktop_layout(
        "Sign in",
        None,
        html! {
            main class="container narrow" {
                h1 { "Sign in" }
                p class="lead" { "Enter your email to open your lead book. First time? An account is created for you." }

                @if let Some(msg) = error {
                    p class="error" role="alert" { (msg) }
                }

                form method="post" action="/auth/signin" class="email-cta" {
                    label for="email" { "Email address" }
                    input type="email" id="email" name="email" placeholder="you@domain.com"
                        autocomplete="email" required;
                    label for="name" { "Name (optional)" }
                    input type="text" id="name" name="name" autocomplete="name";
                    button type="submit" class="primary" { "Sign in" }
                }
            }
        },
    )
}
