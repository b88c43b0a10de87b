//! HTTP handlers for the XSS routes.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::error::LabError;
use crate::mitigation::Rejection;
use crate::observability::metrics::{record_outcome, Outcome};
use crate::security::SecureHeaders;
use crate::xss::mitigations;
use crate::xss::models::{DomResponse, UserInput, XssType};
use crate::xss::render::{self, Markup};

const MODULE: &str = "xss";

#[derive(Debug)]
pub struct XssState {
    pub csp_headers: SecureHeaders,
    pub session_cookie: HeaderValue,
}

/// `GET /`
pub async fn index() -> Html<String> {
    Html(render::index_page())
}

/// Render `input` the way the route for `route` does. The `xss_type`
/// field of the form only labels the page.
pub async fn render_route(
    State(state): State<Arc<XssState>>,
    route: XssType,
    input: UserInput,
) -> Result<Response, LabError> {
    let label = input.xss_type;
    let page = |markup: Markup| render::result_page(&markup, label);

    let response = match route {
        XssType::Vulnerable => Html(page(Markup::trusted(input.input))).into_response(),
        XssType::EscapeHtml => {
            Html(page(Markup::trusted(mitigations::escape_html(&input.input)))).into_response()
        }
        XssType::Csp => {
            let mut response = Html(page(Markup::trusted(input.input))).into_response();
            state.csp_headers.apply(response.headers_mut());
            response
        }
        XssType::Sanitize => {
            Html(page(Markup::trusted(mitigations::sanitize(&input.input)))).into_response()
        }
        XssType::Whitelist => match mitigations::whitelist(&input.input) {
            Some(safe) => Html(page(Markup::trusted(safe))).into_response(),
            None => {
                tracing::warn!(route = route.as_str(), "Input outside the character whitelist");
                record_outcome(MODULE, route.as_str(), Outcome::Rejected);
                return Err(Rejection::new(route.as_str(), "Input contains invalid characters").into());
            }
        },
        XssType::NoJs => {
            let mut response = (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                input.input,
            )
                .into_response();
            SecureHeaders::basic().apply(response.headers_mut());
            response
        }
        XssType::JinjaAutoescape => Html(page(Markup::text(input.input))).into_response(),
        XssType::HttponlyCookie => {
            let mut response = Html(page(Markup::trusted(input.input))).into_response();
            response
                .headers_mut()
                .insert(header::SET_COOKIE, state.session_cookie.clone());
            response
        }
        XssType::DomProtected => Json(DomResponse {
            result: input.input,
            xss_type: label,
            message: "This should be rendered using textContent/innerText in frontend".to_string(),
        })
        .into_response(),
    };

    tracing::debug!(route = route.as_str(), label = label.as_str(), "Rendered input");
    record_outcome(MODULE, route.as_str(), Outcome::Allowed);
    Ok(response)
}
