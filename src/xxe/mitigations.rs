//! Parsing strategies of the XML routes.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node};
use thiserror::Error;
use validator::Validate;

use crate::error::LabError;
use crate::mitigation::validation::first_message;
use crate::mitigation::Rejection;
use crate::xxe::entities::{self, EntityPolicy};
use crate::xxe::models::{UserProfile, XmlStrategy};

static USERNAME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<username>(.*?)</username>").expect("static pattern"));
static EMAIL_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<email>(.*?)</email>").expect("static pattern"));
static AGE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<age>(.*?)</age>").expect("static pattern"));

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("{0}")]
    Parse(#[from] roxmltree::Error),
    /// Entity declarations that could not be expanded.
    #[error("{0}")]
    Entity(String),
    /// Input a secure strategy refuses on principle.
    #[error("{0}")]
    Refused(String),
    /// Well-formed XML with the wrong content.
    #[error("{0}")]
    Invalid(String),
}

impl XmlError {
    pub fn into_lab_error(self, strategy: XmlStrategy) -> LabError {
        match self {
            XmlError::Refused(reason) => Rejection::new(strategy.as_str(), reason).into(),
            XmlError::Parse(roxmltree::Error::DtdDetected) => {
                Rejection::new(strategy.as_str(), "DTD is not allowed").into()
            }
            other => LabError::Malformed(other.to_string()),
        }
    }
}

/// Parse with `strategy` and return the extracted username.
pub fn parse_username(
    strategy: XmlStrategy,
    xml: &str,
    allowed_tags: &HashSet<String>,
) -> Result<String, XmlError> {
    match strategy {
        XmlStrategy::Insecure => {
            let expanded = entities::expand(xml, EntityPolicy::ResolveExternal)?;
            username(&parse_trusted(&expanded)?)
        }
        XmlStrategy::DisableEntities => {
            let expanded = entities::expand(xml, EntityPolicy::InternalOnly)?;
            username(&parse_trusted(&expanded)?)
        }
        XmlStrategy::UseDefusedxml => username(&Document::parse(xml)?),
        XmlStrategy::WhitelistValidation => {
            let doc = Document::parse(xml)?;
            check_whitelist(&doc, allowed_tags)?;
            username(&doc)
        }
        XmlStrategy::CustomParser => extract_profile(xml).map(|p| p.username),
        XmlStrategy::XsdValidation => validate_structure(xml).map(|p| p.username),
    }
}

/// Parse a document whose DTD has already been stripped by the expander.
fn parse_trusted(xml: &str) -> Result<Document<'_>, XmlError> {
    Ok(Document::parse(xml)?)
}

/// Text of the first `username` child of the root element.
pub fn username(doc: &Document) -> Result<String, XmlError> {
    doc.root_element()
        .children()
        .find(|n| n.has_tag_name("username"))
        .map(|n| n.text().unwrap_or_default().to_string())
        .ok_or_else(|| XmlError::Invalid("username element not found".to_string()))
}

/// Every element name must be in `allowed`.
pub fn check_whitelist(doc: &Document, allowed: &HashSet<String>) -> Result<(), XmlError> {
    for node in doc.descendants().filter(Node::is_element) {
        let tag = node.tag_name().name();
        if !allowed.contains(tag) {
            return Err(XmlError::Refused(format!("Disallowed tag: {}", tag)));
        }
    }
    Ok(())
}

/// Regex extraction of the three profile fields. Entities are never
/// processed, markup outside the three tags is ignored.
pub fn extract_profile(xml: &str) -> Result<UserProfile, XmlError> {
    let capture = |re: &Regex| re.captures(xml).map(|c| c[1].to_string());

    let username = capture(&USERNAME_TAG)
        .ok_or_else(|| XmlError::Invalid("Invalid XML format".to_string()))?;
    let age = capture(&AGE_TAG).and_then(|age| {
        (!age.is_empty() && age.bytes().all(|b| b.is_ascii_digit()))
            .then(|| age.parse::<i64>().ok())
            .flatten()
    });

    let profile = UserProfile {
        username,
        email: capture(&EMAIL_TAG),
        age,
    };
    validate_profile(profile)
}

/// Structural schema: root `user` holding `username`, then optional
/// `email`, then optional `age`, each with text content only.
pub fn validate_structure(xml: &str) -> Result<UserProfile, XmlError> {
    let doc = Document::parse(xml)?;
    let root = doc.root_element();
    if !root.has_tag_name("user") {
        return Err(XmlError::Invalid(format!(
            "Element '{}': expected 'user' as the root element",
            root.tag_name().name()
        )));
    }

    const ORDER: [&str; 3] = ["username", "email", "age"];
    let mut fields: [Option<String>; 3] = [None, None, None];
    let mut position = 0;

    for child in root.children() {
        if child.is_text() {
            if child.text().is_some_and(|t| !t.trim().is_empty()) {
                return Err(XmlError::Invalid("Element 'user': text content is not allowed".to_string()));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }

        let tag = child.tag_name().name();
        let index = ORDER[position..]
            .iter()
            .position(|expected| *expected == tag)
            .map(|offset| position + offset)
            .ok_or_else(|| XmlError::Invalid(format!("Element '{}': this element is not expected", tag)))?;
        if child.children().any(|n| n.is_element()) {
            return Err(XmlError::Invalid(format!("Element '{}': element content is not allowed", tag)));
        }
        fields[index] = Some(child.text().unwrap_or_default().to_string());
        position = index + 1;
    }

    let [username, email, age] = fields;
    let username = username
        .ok_or_else(|| XmlError::Invalid("Element 'user': missing child element 'username'".to_string()))?;
    let age = match age {
        Some(age) => Some(age.trim().parse::<i64>().map_err(|_| {
            XmlError::Invalid(format!("Element 'age': '{}' is not a valid integer", age))
        })?),
        None => None,
    };

    validate_profile(UserProfile { username, email, age })
}

/// Render a validated profile as XML. Every value is escaped.
pub fn profile_to_xml(profile: &UserProfile) -> String {
    format!(
        "<user><username>{}</username><email>{}</email><age>{}</age></user>",
        html_escape::encode_text(&profile.username),
        html_escape::encode_text(profile.email.as_deref().unwrap_or_default()),
        profile.age.map(|a| a.to_string()).unwrap_or_default(),
    )
}

fn validate_profile(profile: UserProfile) -> Result<UserProfile, XmlError> {
    profile
        .validate()
        .map_err(|errors| XmlError::Invalid(first_message(&errors)))?;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILE: &str = "<user><username>alice</username><email>alice@example.com</email><age>30</age></user>";
    const XXE: &str = r#"<?xml version="1.0"?>
<!DOCTYPE user [<!ENTITY xxe SYSTEM "file:///etc/hostname">]>
<user><username>&xxe;</username></user>"#;

    fn tags() -> HashSet<String> {
        ["user", "username", "email", "age"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_secure_parsers_refuse_external_entity() {
        for strategy in [
            XmlStrategy::DisableEntities,
            XmlStrategy::UseDefusedxml,
            XmlStrategy::WhitelistValidation,
            XmlStrategy::XsdValidation,
        ] {
            assert!(parse_username(strategy, XXE, &tags()).is_err(), "{:?}", strategy);
        }
    }

    #[test]
    fn test_custom_parser_keeps_reference_literal() {
        let username = parse_username(XmlStrategy::CustomParser, XXE, &tags()).unwrap();
        assert_eq!(username, "&xxe;");
    }

    #[test]
    fn test_plain_profile_parses_everywhere() {
        for strategy in XmlStrategy::ALL {
            assert_eq!(parse_username(strategy, PROFILE, &tags()).unwrap(), "alice", "{:?}", strategy);
        }
    }

    #[test]
    fn test_defused_refuses_any_dtd() {
        let xml = r#"<!DOCTYPE user [<!ENTITY a "x">]><user><username>&a;</username></user>"#;
        let err = parse_username(XmlStrategy::UseDefusedxml, xml, &tags()).unwrap_err();
        assert!(matches!(err, XmlError::Parse(roxmltree::Error::DtdDetected)));
        assert_eq!(parse_username(XmlStrategy::DisableEntities, xml, &tags()).unwrap(), "x");
    }

    #[test]
    fn test_whitelist() {
        let xml = "<user><username>bob</username><script>x</script></user>";
        let err = parse_username(XmlStrategy::WhitelistValidation, xml, &tags()).unwrap_err();
        assert_eq!(err.to_string(), "Disallowed tag: script");
    }

    #[test]
    fn test_structure_rules() {
        let profile = validate_structure(PROFILE).unwrap();
        assert_eq!(profile.age, Some(30));

        assert!(validate_structure("<person><username>alice</username></person>").is_err());
        assert!(validate_structure("<user><email>a@b.co</email></user>").is_err());
        assert!(validate_structure("<user><age>3</age><username>alice</username></user>").is_err());
        assert!(validate_structure("<user><username>alice</username><extra/></user>").is_err());
        assert!(validate_structure("<user><username>alice</username><age>old</age></user>").is_err());
        assert!(validate_structure("<user><username>al</username></user>").is_err());
    }

    #[test]
    fn test_extract_profile() {
        let profile = extract_profile("junk<username>carol</username><age>x1</age>").unwrap();
        assert_eq!(profile.username, "carol");
        assert_eq!(profile.age, None);
        assert!(extract_profile("<name>carol</name>").is_err());
    }

    #[test]
    fn test_profile_to_xml_escapes() {
        let profile = UserProfile {
            username: "a<b>&c".to_string(),
            email: None,
            age: Some(5),
        };
        let xml = profile_to_xml(&profile);
        let doc = Document::parse(&xml).unwrap();
        assert_eq!(username(&doc).unwrap(), "a<b>&c");
    }
}
