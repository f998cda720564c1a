use askama::Template;
use axum::{http::StatusCode, response::Html};
use base64::{Engine as _, engine::general_purpose::STANDARD};

use multiauth::{Enrollment, ProviderKind, Role};

#[derive(Template)]
#[template(path = "index.j2")]
struct IndexTemplate<'a> {
    message: Option<&'a str>,
    providers: &'a [ProviderKind],
}

#[derive(Template)]
#[template(path = "two_factor.j2")]
struct TwoFactorTemplate<'a> {
    secret: Option<&'a str>,
    qr_data_uri: Option<String>,
}

#[derive(Template)]
#[template(path = "protected.j2")]
struct ProtectedTemplate<'a> {
    username: &'a str,
    role: Role,
}

type PageResult = Result<Html<String>, (StatusCode, String)>;

fn render(template: &impl Template) -> PageResult {
    let html = template
        .render()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Html(html))
}

pub(crate) fn index(providers: &[ProviderKind], message: Option<&str>) -> PageResult {
    render(&IndexTemplate { message, providers })
}

/// Enrollment (secret and QR code) on first use, the bare code form otherwise.
pub(crate) fn two_factor(enrollment: Option<&Enrollment>) -> PageResult {
    let qr_data_uri = enrollment
        .and_then(|e| e.qr_png.as_ref())
        .map(|png| format!("data:image/png;base64,{}", STANDARD.encode(png)));
    render(&TwoFactorTemplate {
        secret: enrollment.map(|e| e.secret.as_str()),
        qr_data_uri,
    })
}

pub(crate) fn protected(username: &str, role: Role) -> PageResult {
    render(&ProtectedTemplate { username, role })
}
