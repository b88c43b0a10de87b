//! In-memory user table and document store.
//!
//! Users never change after construction. Documents live in a `DashMap` so
//! token issuance takes the entry lock of exactly one document.

use dashmap::DashMap;

use crate::idor::models::{generate_access_token, Document, DocumentId, Role, User};

#[derive(Debug)]
pub struct DocumentStore {
    users: Vec<User>,
    documents: DashMap<DocumentId, Document>,
}

impl DocumentStore {
    pub fn new(users: Vec<User>, documents: Vec<Document>) -> Self {
        Self {
            users,
            documents: documents.into_iter().map(|d| (d.id, d)).collect(),
        }
    }

    /// Three users and four documents.
    pub fn seeded() -> Self {
        let user = |id, username: &str, password: &str, role, documents: &[DocumentId]| User {
            id,
            username: username.to_string(),
            password: password.to_string(),
            role,
            documents: documents.to_vec(),
        };
        let document = |id, title: &str, content: &str, owner_id, shared_with: &[u32]| Document {
            id,
            title: title.to_string(),
            content: content.to_string(),
            owner_id,
            shared_with: shared_with.to_vec(),
            tags: Vec::new(),
            access_token: None,
        };

        Self::new(
            vec![
                user(1, "alice", "alice123", Role::Regular, &[1, 3]),
                user(2, "bob", "bob123", Role::Regular, &[2]),
                user(3, "admin", "admin123", Role::Admin, &[1, 2, 3, 4]),
            ],
            vec![
                document(1, "Alice Doc 1", "Alice's private document 1", 1, &[3]),
                document(2, "Bob Doc 1", "Bob's private document 1", 2, &[]),
                document(3, "Alice Doc 2", "Alice's private document 2", 1, &[3]),
                document(4, "Admin Doc 1", "Admin's private document", 3, &[]),
            ],
        )
    }

    /// Look up a user by exact username and password.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.username == username && u.password == password)
    }

    /// Snapshot of a document.
    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents.get(&id).map(|entry| entry.value().clone())
    }

    /// Generate a fresh token for `id` and store it, replacing any previous one.
    ///
    /// `authorize` runs under the document's entry lock, so the check and the
    /// write see the same document. Returns `None` if the document is missing.
    pub fn issue_token<E>(
        &self,
        id: DocumentId,
        user: &User,
        authorize: impl FnOnce(&Document) -> Result<(), E>,
    ) -> Option<Result<String, E>> {
        let mut entry = self.documents.get_mut(&id)?;
        if let Err(e) = authorize(entry.value()) {
            return Some(Err(e));
        }
        let token = generate_access_token(id, user.id);
        entry.access_token = Some(token.clone());
        Some(Ok(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate() {
        let store = DocumentStore::seeded();
        assert_eq!(store.authenticate("alice", "alice123").map(|u| u.id), Some(1));
        assert!(store.authenticate("alice", "wrong").is_none());
        assert!(store.authenticate("mallory", "alice123").is_none());
    }

    #[test]
    fn test_issue_token_replaces_previous() {
        let store = DocumentStore::seeded();
        let alice = store.authenticate("alice", "alice123").unwrap().clone();

        let first = store.issue_token(1, &alice, |_| Ok::<_, ()>(())).unwrap().unwrap();
        let second = store.issue_token(1, &alice, |_| Ok::<_, ()>(())).unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(store.get(1).unwrap().access_token, Some(second));
    }

    #[test]
    fn test_issue_token_refused_leaves_document_untouched() {
        let store = DocumentStore::seeded();
        let bob = store.authenticate("bob", "bob123").unwrap().clone();

        let result = store.issue_token(1, &bob, |_| Err("denied"));
        assert_eq!(result, Some(Err("denied")));
        assert_eq!(store.get(1).unwrap().access_token, None);
        assert!(store.issue_token(99, &bob, |_| Ok::<_, ()>(())).is_none());
    }
}
