//! Users, documents and the identifier helpers of the IDOR module.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type UserId = u32;
pub type DocumentId = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Regular,
    Admin,
    Manager,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Plain text on purpose: this is seed data for a lab.
    pub password: String,
    pub role: Role,
    /// Documents this user may read under the query-filter and session policies.
    pub documents: Vec<DocumentId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    pub owner_id: UserId,
    pub shared_with: Vec<UserId>,
    pub tags: Vec<String>,
    pub access_token: Option<String>,
}

impl Document {
    pub fn is_owner(&self, user: &User) -> bool {
        self.owner_id == user.id
    }

    pub fn is_shared_with(&self, user: &User) -> bool {
        self.shared_with.contains(&user.id)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Public view of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentResponse {
    pub id: DocumentId,
    pub title: String,
    pub content: String,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            id: document.id,
            title: document.title,
            content: document.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenQuery {
    pub access_token: String,
}

/// URL-safe base64 of the decimal id.
pub fn obfuscate_id(id: DocumentId) -> String {
    URL_SAFE.encode(id.to_string())
}

/// Inverse of [`obfuscate_id`]; `None` for anything that is not an encoded id.
pub fn deobfuscate_id(obfuscated: &str) -> Option<DocumentId> {
    let bytes = URL_SAFE.decode(obfuscated).ok()?;
    String::from_utf8(bytes).ok()?.trim().parse().ok()
}

/// `sha256_hex("{doc}:{user}:{uuid-v4}")`
pub fn generate_access_token(doc_id: DocumentId, user_id: UserId) -> String {
    let raw = format!("{}:{}:{}", doc_id, user_id, uuid::Uuid::new_v4());
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscated_id() {
        assert_eq!(obfuscate_id(2), "Mg==");
        assert_eq!(deobfuscate_id("Mg=="), Some(2));
        assert_eq!(deobfuscate_id(&obfuscate_id(1234)), Some(1234));
        assert_eq!(deobfuscate_id("%%%"), None);
        assert_eq!(deobfuscate_id("YWJj"), None); // "abc"
    }

    #[test]
    fn test_access_tokens_are_unique_hex() {
        let a = generate_access_token(1, 1);
        let b = generate_access_token(1, 1);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
