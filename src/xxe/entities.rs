//! DOCTYPE handling for the entity-expanding routes.
//!
//! The internal subset is read for `<!ENTITY>` declarations and removed;
//! references in the body are replaced by their values before the document
//! reaches the XML parser. External (`SYSTEM`/`PUBLIC`) entities are either
//! loaded from the filesystem or refused, depending on [`EntityPolicy`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::xxe::mitigations::XmlError;

static DOCTYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<!DOCTYPE\s+[^\[>]*(?:\[(.*?)\]\s*)?>").expect("static pattern")
});

static ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<!ENTITY\s+([A-Za-z_][\w.\-]*)\s+(SYSTEM\s+|PUBLIC\s+(?:"[^"]*"|'[^']*')\s+)?(?:"([^"]*)"|'([^']*)')\s*>"#,
    )
    .expect("static pattern")
});

static ENTITY_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&([A-Za-z_][\w.\-]*);").expect("static pattern"));

const PREDEFINED: [&str; 5] = ["lt", "gt", "amp", "apos", "quot"];

/// Nesting depth of internal entity references.
const MAX_DEPTH: usize = 8;

/// Upper bound on the expanded document.
const MAX_EXPANDED_LEN: usize = 1024 * 1024;

/// What to do with external entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPolicy {
    /// Read the referenced file. This is the vulnerability.
    ResolveExternal,
    /// Expand internal entities only; referencing an external one fails.
    InternalOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entity {
    Internal(String),
    External(String),
}

/// Remove the DOCTYPE and substitute entity references.
///
/// With [`EntityPolicy::ResolveExternal`] this reads files synchronously;
/// call it off the async runtime.
pub fn expand(xml: &str, policy: EntityPolicy) -> Result<String, XmlError> {
    let Some(doctype) = DOCTYPE.captures(xml) else {
        return Ok(xml.to_string());
    };

    let subset = doctype.get(1).map_or("", |m| m.as_str());
    let entities: HashMap<String, Entity> = ENTITY_DECL
        .captures_iter(subset)
        .map(|caps| {
            let name = caps[1].to_string();
            let value = caps
                .get(3)
                .or_else(|| caps.get(4))
                .map_or(String::new(), |m| m.as_str().to_string());
            let entity = if caps.get(2).is_some() {
                Entity::External(value)
            } else {
                Entity::Internal(value)
            };
            (name, entity)
        })
        .collect();

    let whole = doctype.get(0).map_or(0..0, |m| m.range());
    let body = format!("{}{}", &xml[..whole.start], &xml[whole.end..]);

    let expander = Expander { entities: &entities, policy };
    let expanded = expander.substitute(&body, 0)?;
    if expanded.len() > MAX_EXPANDED_LEN {
        return Err(XmlError::Entity("Entity expansion limit exceeded".to_string()));
    }
    Ok(expanded)
}

struct Expander<'a> {
    entities: &'a HashMap<String, Entity>,
    policy: EntityPolicy,
}

impl Expander<'_> {
    fn substitute(&self, text: &str, depth: usize) -> Result<String, XmlError> {
        if depth > MAX_DEPTH {
            return Err(XmlError::Entity("Entity expansion limit exceeded".to_string()));
        }

        let mut error = None;
        let replaced = ENTITY_REF.replace_all(text, |caps: &Captures| {
            if error.is_some() {
                return String::new();
            }
            match self.resolve(&caps[1], depth) {
                Ok(Some(value)) => value,
                // Unknown and predefined references are left to the parser.
                Ok(None) => caps[0].to_string(),
                Err(e) => {
                    error = Some(e);
                    String::new()
                }
            }
        });

        match error {
            Some(e) => Err(e),
            None if replaced.len() > MAX_EXPANDED_LEN => {
                Err(XmlError::Entity("Entity expansion limit exceeded".to_string()))
            }
            None => Ok(replaced.into_owned()),
        }
    }

    fn resolve(&self, name: &str, depth: usize) -> Result<Option<String>, XmlError> {
        if PREDEFINED.contains(&name) {
            return Ok(None);
        }
        match self.entities.get(name) {
            None => Ok(None),
            Some(Entity::Internal(value)) => self.substitute(value, depth + 1).map(Some),
            Some(Entity::External(uri)) => match self.policy {
                EntityPolicy::InternalOnly => Err(XmlError::Refused(format!(
                    "External entity reference refused: {}",
                    name
                ))),
                EntityPolicy::ResolveExternal => {
                    let path = uri.strip_prefix("file://").unwrap_or(uri);
                    let content = std::fs::read_to_string(path).map_err(|e| {
                        XmlError::Entity(format!("Cannot load external entity '{}': {}", uri, e))
                    })?;
                    Ok(Some(html_escape::encode_text(&content).into_owned()))
                }
            },
        }
    }
}
