use maud::{html, Markup, PreEscaped};

use super::layout;
use crate::{
    flash::Flash,
    models::{Book, BookStatus, CatalogSummary, User},
};

pub fn login(flashes: &[Flash]) -> Markup {
    layout(
        "Login",
        None,
        flashes,
        html! {
            h1 { "Sign in" }
            form.stacked method="post" action="/login" {
                label { "Email" input type="email" name="email" required; }
                label { "Password" input type="password" name="password" required; }
                p { button type="submit" { "Login" } }
            }
            p {
                a href="/forgot_password" { "Forgot your password?" }
                " · "
                a href="/register" { "Create an account" }
            }
        },
    )
}

pub fn register(flashes: &[Flash]) -> Markup {
    layout(
        "Register",
        None,
        flashes,
        html! {
            h1 { "Create an account" }
            form.stacked method="post" action="/register" {
                label { "Email" input type="email" name="email" required; }
                label { "Name" input type="text" name="name"; }
                label { "Password" input type="password" name="password" required; }
                label { "Recovery answer" input type="text" name="recovery_answer" required; }
                p { button type="submit" { "Register" } }
            }
        },
    )
}

pub fn forgot_password(flashes: &[Flash]) -> Markup {
    layout(
        "Forgot password",
        None,
        flashes,
        html! {
            h1 { "Reset your password" }
            form.stacked method="post" action="/forgot_password" {
                label { "Email" input type="email" name="username" required; }
                p { button type="submit" { "Send reset link" } }
            }
        },
    )
}

pub fn reset_password(token: &str, flashes: &[Flash]) -> Markup {
    layout(
        "Choose a new password",
        None,
        flashes,
        html! {
            h1 { "Choose a new password" }
            form.stacked method="post" action={ "/reset_password/" (token) } {
                label { "New password" input type="password" name="password" required; }
                p { button type="submit" { "Update password" } }
            }
        },
    )
}

fn avatar(user: &User) -> Markup {
    html! {
        @if let Some(ref pic) = user.profile_pic {
            img.avatar src={ "/static/profiles/" (pic) } alt="Profile picture";
        }
    }
}

pub fn profile(user: &User, flashes: &[Flash]) -> Markup {
    layout(
        "Profile",
        Some(user),
        flashes,
        html! {
            h1 { "Profile" }
            (avatar(user))
            p { strong { "Name: " } (user.display_name()) }
            p { strong { "Email: " } (user.email) }
            @if let Some(created) = user.created_at {
                p { strong { "Member since: " } (created.format("%Y-%m-%d")) }
            }
            p { a href="/update_profile" { "Edit profile" } }
        },
    )
}

pub fn update_profile(user: &User, flashes: &[Flash]) -> Markup {
    layout(
        "Edit profile",
        Some(user),
        flashes,
        html! {
            h1 { "Edit profile" }
            (avatar(user))
            @if user.profile_pic.is_some() {
                form method="post" action="/remove_profile_pic" {
                    button type="submit" { "Remove picture" }
                }
            }
            form.stacked method="post" action="/update_profile" enctype="multipart/form-data" {
                label { "Name" input type="text" name="name" value=(user.name.as_deref().unwrap_or_default()); }
                label { "Email" input type="email" name="username" value=(user.email) required; }
                label { "New password (leave blank to keep)" input type="password" name="password"; }
                label { "Profile picture" input type="file" name="profile_pic" accept="image/*"; }
                p { button type="submit" { "Save" } }
            }
            h2 { "Danger zone" }
            form method="post" action="/delete_account" onsubmit="return confirm('Delete your account permanently?');" {
                button type="submit" { "Delete account" }
            }
        },
    )
}

pub fn dashboard(user: &User, books: &[Book], summary: &CatalogSummary, flashes: &[Flash]) -> Markup {
    layout(
        "Dashboard",
        Some(user),
        flashes,
        html! {
            h1 { "Library catalog" }
            p.stats {
                span { "Total: " (summary.total) }
                span { "Available: " (summary.available) }
                span { "Borrowed: " (summary.borrowed) }
                a href="/download_report" { "Download report" }
            }
            form #add-book {
                input name="title" placeholder="Title" required;
                input name="author" placeholder="Author" required;
                input name="category" placeholder="Category" required;
                button type="submit" { "Add book" }
            }
            table {
                thead {
                    tr {
                        th { "Title" }
                        th { "Author" }
                        th { "Category" }
                        th { "Status" }
                        th { "PDF" }
                        th { "Actions" }
                    }
                }
                tbody {
                    @for book in books {
                        tr {
                            td { (book.title) }
                            td { (book.author) }
                            td { (book.category) }
                            td { (book.status) }
                            td {
                                @if let Some(ref pdf) = book.pdf_file {
                                    a href={ "/static/pdfs/" (pdf) } target="_blank" { "Open" }
                                }
                                form method="post" action={ "/upload_pdf/" (book.id) } enctype="multipart/form-data" {
                                    input type="file" name="file" accept="application/pdf";
                                    button type="submit" { "Upload" }
                                }
                            }
                            td {
                                @match book.status {
                                    BookStatus::Available => { a href={ "/issue/" (book.id) } { "Issue" } },
                                    BookStatus::Borrowed => { a href={ "/return/" (book.id) } { "Return" } },
                                }
                                " "
                                a href={ "/delete/" (book.id) } onclick="return confirm('Delete this book?');" { "Delete" }
                            }
                        }
                    }
                }
            }
            script { (PreEscaped(ADD_BOOK_SCRIPT)) }
        },
    )
}

const ADD_BOOK_SCRIPT: &str = r#"
document.getElementById("add-book").addEventListener("submit", async (event) => {
    event.preventDefault();
    const form = event.target;
    const body = {
        title: form.title.value,
        author: form.author.value,
        category: form.category.value,
    };
    try {
        const response = await fetch("/api/add", {
            method: "POST",
            headers: { "Content-Type": "application/json" },
            body: JSON.stringify(body),
        });
        const data = await response.json();
        if (data.status === "success") {
            window.location.reload();
        } else {
            alert(data.message);
        }
    } catch (error) {
        console.error("Error adding book:", error);
    }
});
"#;
