//! Server-rendered HTML pages

pub mod emails;
pub mod pages;

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::{flash::Flash, models::User};

/// Common page chrome: navigation, flash messages, content
pub fn layout(title: &str, user: Option<&User>, flashes: &[Flash], content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " | BiblioTech" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                nav {
                    a.brand href="/" { "BiblioTech" }
                    @if let Some(user) = user {
                        span.nav-links {
                            a href="/" { "Dashboard" }
                            a href="/profile" { (user.display_name()) }
                            a href="/logout" { "Logout" }
                        }
                    } @else {
                        span.nav-links {
                            a href="/login" { "Login" }
                            a href="/register" { "Register" }
                        }
                    }
                }
                main {
                    @for flash in flashes {
                        div class={ "flash flash-" (flash.level.as_str()) } { (flash.message) }
                    }
                    (content)
                }
            }
        }
    }
}

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 0; background: #f4f6fb; color: #222; }
nav { display: flex; justify-content: space-between; padding: 12px 24px; background: #1f2a44; }
nav a { color: #fff; text-decoration: none; margin-left: 16px; }
nav a.brand { margin-left: 0; font-weight: bold; }
main { max-width: 960px; margin: 24px auto; padding: 0 16px; }
.flash { padding: 10px 14px; border-radius: 4px; margin-bottom: 12px; }
.flash-success { background: #dff5e1; color: #1b5e20; }
.flash-error { background: #fde2e1; color: #8e1c14; }
form.stacked label { display: block; margin-top: 10px; }
form.stacked input { width: 100%; padding: 6px; box-sizing: border-box; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { border: 1px solid #d0d6e2; padding: 6px 8px; text-align: left; }
th { background: #c8dcff; }
.stats span { display: inline-block; margin-right: 24px; font-weight: bold; }
.avatar { width: 96px; height: 96px; border-radius: 50%; object-fit: cover; }
"#;
