//! HTML bodies of notification emails

use maud::{html, Markup, DOCTYPE};

fn email_shell(heading: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            body style="font-family: Arial, sans-serif; color: #222;" {
                h2 { (heading) }
                (body)
                hr;
                p style="font-size: 12px; color: #777;" { "BiblioTech Library Management" }
            }
        }
    }
}

pub fn welcome(name: &str, username: &str) -> Markup {
    email_shell(
        "Welcome to BiblioTech!",
        html! {
            p { "Hello " (name) "," }
            p { "Your account has been created. You can sign in with " strong { (username) } "." }
        },
    )
}

pub fn reset_link(username: &str, reset_url: &str) -> Markup {
    email_shell(
        "Password Reset Request",
        html! {
            p { "A password reset was requested for " strong { (username) } "." }
            p { a href=(reset_url) { "Reset your password" } }
            p { "This link expires in one hour. If you did not ask for it, ignore this message." }
        },
    )
}

pub fn password_reset_confirmation(username: &str) -> Markup {
    email_shell(
        "Password Changed Successfully",
        html! {
            p { "The password for " strong { (username) } " was changed." }
        },
    )
}

pub fn delete_confirmation(username: &str, user_id: i64) -> Markup {
    email_shell(
        "Account Deletion Confirmation",
        html! {
            p { "The account " strong { (username) } " (id " (user_id) ") has been permanently deleted." }
        },
    )
}
