//! Built-in page templates, looked up by name.

use lazysignup_auth::FieldErrors;
use lazysignup_core::error::{LazyResult, LazySignupError};

/// Values available to every template.
#[derive(Debug, Default)]
pub struct PageContext<'a> {
    /// Where the form posts to.
    pub action: &'a str,
    /// Previously submitted username, echoed back on errors.
    pub username: &'a str,
    pub email: &'a str,
    /// Whether the form has an email field.
    pub requires_email: bool,
    pub errors: Option<&'a FieldErrors>,
    pub login_url: &'a str,
}

/// A named render function.
#[derive(Clone, Copy)]
pub struct Template {
    pub name: &'static str,
    render: fn(&PageContext<'_>) -> String,
}

impl Template {
    pub fn render(&self, ctx: &PageContext<'_>) -> String {
        (self.render)(ctx)
    }
}

impl std::fmt::Debug for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Template").field("name", &self.name).finish()
    }
}

pub const DONE_TEMPLATE: &str = "lazysignup/done.html";

const TEMPLATES: &[Template] = &[
    Template {
        name: "lazysignup/convert.html",
        render: render_convert_page,
    },
    Template {
        name: "lazysignup/convert_ajax.html",
        render: render_convert_form,
    },
    Template {
        name: DONE_TEMPLATE,
        render: render_done_page,
    },
];

/// Look up a template by name.
pub fn lookup(name: &str) -> LazyResult<Template> {
    TEMPLATES
        .iter()
        .find(|t| t.name == name)
        .copied()
        .ok_or_else(|| LazySignupError::Configuration(format!("unknown template: {name}")))
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn field_errors(ctx: &PageContext<'_>, field: &str) -> String {
    let Some(messages) = ctx.errors.and_then(|e| e.get(field)) else {
        return String::new();
    };
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", escape(m)))
        .collect();
    format!("<ul class=\"errorlist\">{items}</ul>")
}

fn input(ctx: &PageContext<'_>, label: &str, name: &str, kind: &str, value: &str) -> String {
    format!(
        "<p>{errors}<label for=\"id_{name}\">{label}:</label> \
         <input type=\"{kind}\" name=\"{name}\" id=\"id_{name}\" value=\"{value}\"></p>\n",
        errors = field_errors(ctx, name),
        value = escape(value),
    )
}

fn render_convert_form(ctx: &PageContext<'_>) -> String {
    let mut form = format!(
        "<form method=\"post\" action=\"{}\" id=\"lazysignup-convert\">\n",
        escape(ctx.action)
    );
    form.push_str(&input(ctx, "Username", "username", "text", ctx.username));
    if ctx.requires_email {
        form.push_str(&input(ctx, "Email", "email", "email", ctx.email));
    }
    form.push_str(&input(ctx, "Password", "password1", "password", ""));
    form.push_str(&input(ctx, "Password confirmation", "password2", "password", ""));
    form.push_str("<button type=\"submit\">Save</button>\n</form>\n");
    form
}

fn render_convert_page(ctx: &PageContext<'_>) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Create your account</title></head>\n\
         <body>\n<h1>Create your account</h1>\n{}</body></html>\n",
        render_convert_form(ctx)
    )
}

fn render_done_page(ctx: &PageContext<'_>) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Account created</title></head>\n\
         <body>\n<h1>Your account is ready</h1>\n\
         <p>You can now <a href=\"{}\">sign in</a> with your new username and password.</p>\n\
         </body></html>\n",
        escape(ctx.login_url)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_builtin_names() {
        for name in [
            "lazysignup/convert.html",
            "lazysignup/convert_ajax.html",
            "lazysignup/done.html",
        ] {
            assert_eq!(lookup(name).unwrap().name, name);
        }
        assert!(matches!(
            lookup("lazysignup/missing.html").unwrap_err(),
            LazySignupError::Configuration(_)
        ));
    }

    #[test]
    fn ajax_template_is_a_bare_form() {
        let html = lookup("lazysignup/convert_ajax.html")
            .unwrap()
            .render(&PageContext {
                action: "/convert/",
                ..Default::default()
            });
        assert!(html.starts_with("<form"));
        assert!(!html.contains("<html>"));
        assert!(!html.contains("name=\"email\""));
    }

    #[test]
    fn errors_and_values_are_escaped() {
        let mut errors = FieldErrors::default();
        errors.add("username", "bad <name>");
        let html = lookup("lazysignup/convert.html")
            .unwrap()
            .render(&PageContext {
                action: "/convert/",
                username: "\"><script>",
                requires_email: true,
                errors: Some(&errors),
                ..Default::default()
            });
        assert!(html.contains("bad &lt;name&gt;"));
        assert!(html.contains("&quot;&gt;&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("name=\"email\""));
    }
}
