//! Result page rendering.
//!
//! Page text is escaped unless it is wrapped in [`Markup::trusted`], the
//! same contract an autoescaping template engine offers.

use std::fmt::Write;

use crate::xss::models::XssType;

/// A fragment to place into the result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    /// Inserted verbatim.
    Trusted(String),
    /// Escaped on insertion.
    Text(String),
}

impl Markup {
    pub fn trusted(s: impl Into<String>) -> Self {
        Markup::Trusted(s.into())
    }

    pub fn text(s: impl Into<String>) -> Self {
        Markup::Text(s.into())
    }

    fn write_to(&self, out: &mut String) {
        match self {
            Markup::Trusted(s) => out.push_str(s),
            Markup::Text(s) => {
                html_escape::encode_quoted_attribute_to_string(s, out);
            }
        }
    }
}

/// Render the result page for `xss_type`.
pub fn result_page(result: &Markup, xss_type: XssType) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>XSS result</title></head>\n<body>\n",
    );
    page.push_str("<h1>Result (");
    Markup::text(xss_type.as_str()).write_to(&mut page);
    page.push_str(")</h1>\n<div id=\"result\">");
    result.write_to(&mut page);
    page.push_str("</div>\n<p><a href=\"/xss/\">Back</a></p>\n</body>\n</html>\n");
    page
}

/// The form listing every route.
pub fn index_page() -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>XSS lab</title></head>\n<body>\n<h1>XSS lab</h1>\n",
    );
    for xss_type in XssType::ALL {
        let _ = write!(
            page,
            "<form method=\"post\" action=\"/xss{path}\">\n\
             <input type=\"hidden\" name=\"xss_type\" value=\"{name}\">\n\
             <label>{name} <input type=\"text\" name=\"input\" maxlength=\"500\"></label>\n\
             <button type=\"submit\">Send</button>\n</form>\n",
            path = xss_type.path(),
            name = xss_type.as_str(),
        );
    }
    page.push_str("</body>\n</html>\n");
    page
}
