//! Authorization policies.
//!
//! One [`AccessPolicy`] per route. `authorize` is the whole decision for a
//! request: it looks the document up (or refuses before looking, for the
//! policies that filter by the user's own document list) and applies the
//! policy's rule.

use serde::{Deserialize, Serialize};

use crate::error::LabError;
use crate::idor::models::{Document, DocumentId, Role, User};
use crate::idor::store::DocumentStore;

const CONFIDENTIAL: &str = "confidential";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    /// Authentication only.
    Unchecked,
    DirectAuth,
    Acl,
    QueryFilter,
    SessionBased,
    Abac,
    Token,
    /// Base64 ids; the authorization rule is the same as `DirectAuth`.
    Obfuscated,
}

impl AccessPolicy {
    pub const ALL: [AccessPolicy; 8] = [
        AccessPolicy::Unchecked,
        AccessPolicy::DirectAuth,
        AccessPolicy::Acl,
        AccessPolicy::QueryFilter,
        AccessPolicy::SessionBased,
        AccessPolicy::Abac,
        AccessPolicy::Token,
        AccessPolicy::Obfuscated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessPolicy::Unchecked => "vulnerable",
            AccessPolicy::DirectAuth => "direct-auth",
            AccessPolicy::Acl => "acl",
            AccessPolicy::QueryFilter => "query-filter",
            AccessPolicy::SessionBased => "session-based",
            AccessPolicy::Abac => "abac",
            AccessPolicy::Token => "token-based",
            AccessPolicy::Obfuscated => "obfuscation",
        }
    }

    /// Route of the document endpoint below `/idor`.
    pub fn path(&self) -> String {
        match self {
            AccessPolicy::Unchecked => "/vulnerable/document/{doc_id}".to_string(),
            AccessPolicy::Obfuscated => "/secure/obfuscation/document/{obfuscated_id}".to_string(),
            other => format!("/secure/{}/document/{{doc_id}}", other.as_str()),
        }
    }

    /// Is the check made against the user's document list before lookup?
    fn filters_before_lookup(&self) -> bool {
        matches!(self, AccessPolicy::QueryFilter | AccessPolicy::SessionBased)
    }

    /// Document-level rule. `token` is only consulted by [`AccessPolicy::Token`].
    pub fn allowed(&self, user: &User, document: &Document, token: Option<&str>) -> Result<(), &'static str> {
        let owner_or_shared = document.is_owner(user) || document.is_shared_with(user);
        match self {
            AccessPolicy::Unchecked => Ok(()),
            AccessPolicy::DirectAuth | AccessPolicy::Acl | AccessPolicy::Obfuscated => {
                if owner_or_shared {
                    Ok(())
                } else {
                    Err("Not authorized to access this document")
                }
            }
            AccessPolicy::QueryFilter | AccessPolicy::SessionBased => {
                if user.documents.contains(&document.id) {
                    Ok(())
                } else {
                    Err("Not authorized to access this document")
                }
            }
            AccessPolicy::Abac => {
                let confidential = document.has_tag(CONFIDENTIAL);
                if user.role == Role::Admin && !confidential {
                    Ok(())
                } else if !owner_or_shared {
                    Err("Not authorized to access this document")
                } else if confidential && !document.is_owner(user) {
                    Err("Not authorized to access confidential documents")
                } else {
                    Ok(())
                }
            }
            AccessPolicy::Token => match (&document.access_token, token) {
                (Some(stored), Some(presented)) if stored == presented => Ok(()),
                _ => Err("Invalid access token"),
            },
        }
    }

    /// Resolve `doc_id` for `user` under this policy.
    pub fn authorize(
        &self,
        store: &DocumentStore,
        user: &User,
        doc_id: DocumentId,
        token: Option<&str>,
    ) -> Result<Document, LabError> {
        if self.filters_before_lookup() && !user.documents.contains(&doc_id) {
            return Err(LabError::Forbidden(
                "Not authorized to access this document".to_string(),
            ));
        }

        let document = store
            .get(doc_id)
            .ok_or_else(|| LabError::NotFound("Document not found".to_string()))?;

        self.allowed(user, &document, token)
            .map_err(|reason| LabError::Forbidden(reason.to_string()))?;

        Ok(document)
    }
}

/// Token issuance rule: owner or shared.
pub fn may_issue_token(user: &User, document: &Document) -> Result<(), LabError> {
    if document.is_owner(user) || document.is_shared_with(user) {
        Ok(())
    } else {
        Err(LabError::Forbidden(
            "Not authorized to generate token for this document".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(store: &DocumentStore, name: &str) -> User {
        store
            .authenticate(name, &format!("{}123", name))
            .unwrap()
            .clone()
    }

    #[test]
    fn test_seed_table_decisions() {
        let store = DocumentStore::seeded();
        let alice = user(&store, "alice");
        let bob = user(&store, "bob");

        for policy in [
            AccessPolicy::DirectAuth,
            AccessPolicy::Acl,
            AccessPolicy::QueryFilter,
            AccessPolicy::SessionBased,
            AccessPolicy::Abac,
            AccessPolicy::Obfuscated,
        ] {
            assert!(policy.authorize(&store, &alice, 1, None).is_ok(), "{:?}", policy);
            assert!(policy.authorize(&store, &alice, 3, None).is_ok(), "{:?}", policy);
            assert!(
                matches!(policy.authorize(&store, &alice, 2, None), Err(LabError::Forbidden(_))),
                "{:?}",
                policy
            );
            assert!(policy.authorize(&store, &bob, 2, None).is_ok(), "{:?}", policy);
            assert!(policy.authorize(&store, &bob, 4, None).is_err(), "{:?}", policy);
        }
    }

    #[test]
    fn test_unchecked_allows_everything() {
        let store = DocumentStore::seeded();
        let alice = user(&store, "alice");
        for id in 1..=4 {
            assert!(AccessPolicy::Unchecked.authorize(&store, &alice, id, None).is_ok());
        }
    }

    #[test]
    fn test_admin_under_abac_reads_every_non_confidential_document() {
        let store = DocumentStore::seeded();
        let admin = user(&store, "admin");
        for id in 1..=4 {
            assert!(AccessPolicy::Abac.authorize(&store, &admin, id, None).is_ok());
        }
        // Shared-or-owner policies still refuse the admin Bob's document.
        assert!(AccessPolicy::DirectAuth.authorize(&store, &admin, 2, None).is_err());
    }

    #[test]
    fn test_abac_confidential_only_for_owner() {
        let mut document = DocumentStore::seeded().get(1).unwrap();
        document.tags.push("confidential".to_string());
        let store = DocumentStore::seeded();
        let alice = user(&store, "alice");
        let admin = user(&store, "admin");

        assert!(AccessPolicy::Abac.allowed(&alice, &document, None).is_ok());
        assert_eq!(
            AccessPolicy::Abac.allowed(&admin, &document, None),
            Err("Not authorized to access confidential documents")
        );
    }

    #[test]
    fn test_filtered_policies_refuse_before_lookup() {
        let store = DocumentStore::seeded();
        let alice = user(&store, "alice");
        assert!(matches!(
            AccessPolicy::QueryFilter.authorize(&store, &alice, 99, None),
            Err(LabError::Forbidden(_))
        ));
        assert!(matches!(
            AccessPolicy::DirectAuth.authorize(&store, &alice, 99, None),
            Err(LabError::NotFound(_))
        ));
    }

    #[test]
    fn test_token_policy() {
        let store = DocumentStore::seeded();
        let alice = user(&store, "alice");

        assert!(AccessPolicy::Token.authorize(&store, &alice, 1, Some("")).is_err());
        let token = store
            .issue_token(1, &alice, |d| may_issue_token(&alice, d))
            .unwrap()
            .unwrap();
        assert!(AccessPolicy::Token.authorize(&store, &alice, 1, Some(&token)).is_ok());
        assert!(AccessPolicy::Token.authorize(&store, &alice, 1, Some("forged")).is_err());
    }

    #[test]
    fn test_paths() {
        assert_eq!(AccessPolicy::Abac.path(), "/secure/abac/document/{doc_id}");
        assert_eq!(AccessPolicy::Token.path(), "/secure/token-based/document/{doc_id}");
    }
}
