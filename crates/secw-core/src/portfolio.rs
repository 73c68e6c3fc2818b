//! A named, insertion-ordered collection of documents with unique ids and
//! unique names. All operations run under the wallet's write lock; the
//! portfolio itself enforces the uniqueness and validation gates.

use secw_types::{CertValidator, Document, Id, SecwError};
use uuid::Uuid;

/// What an update changed, for the notification flags.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub old: Document,
    pub non_secret_changed: bool,
    pub secret_changed: bool,
}

#[derive(Debug, Clone)]
pub struct Portfolio {
    pub name: String,
    documents: Vec<Document>,
    sequence: u64,
}

impl Portfolio {
    pub fn new(name: impl Into<String>) -> Portfolio {
        Portfolio {
            name: name.into(),
            documents: Vec::new(),
            sequence: 0,
        }
    }

    /// Rebuild a portfolio from already-validated documents (database load).
    pub fn from_documents(name: impl Into<String>, documents: Vec<Document>) -> Portfolio {
        Portfolio {
            name: name.into(),
            documents,
            sequence: 0,
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get_by_id(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name == name)
    }

    /// Insert a new document: assign an id when none is given, enforce id and
    /// name uniqueness, validate the authoritative form, append. Returns the
    /// document id.
    pub fn insert(
        &mut self,
        mut doc: Document,
        certs: &dyn CertValidator,
    ) -> Result<Id, SecwError> {
        if doc.id.is_empty() {
            doc.id = Uuid::new_v4().to_string();
        } else if self.get_by_id(&doc.id).is_some() {
            return Err(SecwError::IllegalAction {
                reason: format!("document id '{}' already exists", doc.id),
            });
        }
        if self.get_by_name(&doc.name).is_some() {
            return Err(SecwError::NameAlreadyExists {
                name: doc.name.clone(),
            });
        }

        // The stored form is always the authoritative one.
        doc.contains_private = true;
        doc.validate(certs)?;

        let id = doc.id.clone();
        self.documents.push(doc);
        Ok(id)
    }

    /// Replace the document carrying `incoming.id`. The type may not change.
    /// When the incoming copy has no private part, the stored secrets are
    /// carried over unchanged, so producers can edit metadata without ever
    /// seeing them.
    pub fn update(
        &mut self,
        incoming: Document,
        certs: &dyn CertValidator,
    ) -> Result<UpdateOutcome, SecwError> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == incoming.id)
            .ok_or_else(|| SecwError::DocumentDoNotExist {
                id: incoming.id.clone(),
            })?;

        let old = self.documents[index].clone();

        if old.doc_type() != incoming.doc_type() {
            return Err(SecwError::IllegalAction {
                reason: format!(
                    "document type may not change ({} -> {})",
                    old.doc_type(),
                    incoming.doc_type()
                ),
            });
        }

        if incoming.name != old.name
            && self
                .documents
                .iter()
                .any(|d| d.id != incoming.id && d.name == incoming.name)
        {
            return Err(SecwError::NameAlreadyExists {
                name: incoming.name.clone(),
            });
        }

        let had_private = incoming.contains_private;
        let mut new = incoming;
        if !had_private {
            new.payload.adopt_private_from(&old.payload);
        }
        new.contains_private = true;
        new.validate(certs)?;

        let non_secret_changed = !old.equals_public(&new)
            || old.name != new.name
            || old.tags != new.tags
            || old.usages != new.usages;
        let secret_changed = had_private && !old.equals_private(&new);

        self.documents[index] = new;

        Ok(UpdateOutcome {
            old,
            non_secret_changed,
            secret_changed,
        })
    }

    /// Remove a document by id, returning the prior value.
    pub fn remove(&mut self, id: &str) -> Result<Document, SecwError> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| SecwError::DocumentDoNotExist { id: id.to_string() })?;
        Ok(self.documents.remove(index))
    }

    /// Advance and return the per-portfolio notification sequence.
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secw_types::{Payload, PermissiveValidator};

    fn doc(name: &str, username: &str, password: &str) -> Document {
        let mut d = Document::new(name, Payload::user_and_password(username, password));
        d.add_usage("discovery_monitoring");
        d
    }

    #[test]
    fn insert_assigns_id_and_keeps_order() {
        let mut pf = Portfolio::new("default");
        let a = pf.insert(doc("A", "u1", "p1"), &PermissiveValidator).unwrap();
        let b = pf.insert(doc("B", "u2", "p2"), &PermissiveValidator).unwrap();

        assert_ne!(a, b);
        assert!(!a.is_empty());
        assert_eq!(pf.len(), 2);
        assert_eq!(pf.documents()[0].name, "A");
        assert_eq!(pf.documents()[1].name, "B");
        assert_eq!(pf.get_by_id(&a).unwrap().name, "A");
        assert_eq!(pf.get_by_name("B").unwrap().id, b);
    }

    #[test]
    fn insert_rejects_duplicate_name() {
        let mut pf = Portfolio::new("default");
        pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();
        let err = pf.insert(doc("A", "x", "y"), &PermissiveValidator).unwrap_err();
        assert_eq!(err, SecwError::NameAlreadyExists { name: "A".into() });
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut pf = Portfolio::new("default");
        let mut first = doc("A", "u", "p");
        first.id = "fixed".into();
        pf.insert(first, &PermissiveValidator).unwrap();

        let mut second = doc("B", "u", "p");
        second.id = "fixed".into();
        let err = pf.insert(second, &PermissiveValidator).unwrap_err();
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn insert_validates_stored_form() {
        let mut pf = Portfolio::new("default");
        // A redacted copy is invalid as the stored form: the password is
        // required once contains_private is forced back on.
        let incoming = doc("A", "u", "p").redacted();
        let err = pf.insert(incoming, &PermissiveValidator).unwrap_err();
        assert_eq!(err.code(), 9);
    }

    #[test]
    fn update_replaces_and_reports_changes() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        let mut edit = doc("A", "u2", "p2");
        edit.id = id.clone();
        let outcome = pf.update(edit, &PermissiveValidator).unwrap();

        assert!(outcome.non_secret_changed);
        assert!(outcome.secret_changed);
        assert_eq!(outcome.old.name, "A");
        match &pf.get_by_id(&id).unwrap().payload {
            Payload::UserAndPassword { public, private } => {
                assert_eq!(public.username, "u2");
                assert_eq!(private.password, "p2");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn update_without_private_preserves_secret() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        // Producer-side edit: redacted copy, new username.
        let mut edit = doc("A", "u2", "ignored").redacted();
        edit.id = id.clone();
        let outcome = pf.update(edit, &PermissiveValidator).unwrap();

        assert!(outcome.non_secret_changed);
        assert!(!outcome.secret_changed);
        match &pf.get_by_id(&id).unwrap().payload {
            Payload::UserAndPassword { public, private } => {
                assert_eq!(public.username, "u2");
                assert_eq!(private.password, "p");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn update_same_content_reports_no_change() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        let mut edit = doc("A", "u", "p");
        edit.id = id.clone();
        let outcome = pf.update(edit, &PermissiveValidator).unwrap();
        assert!(!outcome.non_secret_changed);
        assert!(!outcome.secret_changed);
    }

    #[test]
    fn update_rejects_type_change() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        let mut edit = Document::new("A", Payload::login_and_token("l", "t"));
        edit.id = id;
        let err = pf.update(edit, &PermissiveValidator).unwrap_err();
        assert_eq!(err.code(), 7);
    }

    #[test]
    fn update_rejects_stolen_name() {
        let mut pf = Portfolio::new("default");
        pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();
        let id_b = pf.insert(doc("B", "u", "p"), &PermissiveValidator).unwrap();

        let mut edit = doc("A", "u", "p");
        edit.id = id_b;
        let err = pf.update(edit, &PermissiveValidator).unwrap_err();
        assert_eq!(err, SecwError::NameAlreadyExists { name: "A".into() });
    }

    #[test]
    fn update_missing_document() {
        let mut pf = Portfolio::new("default");
        let mut edit = doc("A", "u", "p");
        edit.id = "missing".into();
        let err = pf.update(edit, &PermissiveValidator).unwrap_err();
        assert_eq!(
            err,
            SecwError::DocumentDoNotExist {
                id: "missing".into()
            }
        );
    }

    #[test]
    fn invalid_update_leaves_stored_version() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        let mut edit = doc("A", "", "p");
        edit.id = id.clone();
        assert!(pf.update(edit, &PermissiveValidator).is_err());

        match &pf.get_by_id(&id).unwrap().payload {
            Payload::UserAndPassword { public, .. } => assert_eq!(public.username, "u"),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn remove_returns_prior_value() {
        let mut pf = Portfolio::new("default");
        let id = pf.insert(doc("A", "u", "p"), &PermissiveValidator).unwrap();

        let removed = pf.remove(&id).unwrap();
        assert_eq!(removed.name, "A");
        assert!(pf.is_empty());
        assert_eq!(
            pf.remove(&id).unwrap_err(),
            SecwError::DocumentDoNotExist { id }
        );
    }

    #[test]
    fn sequence_is_dense() {
        let mut pf = Portfolio::new("default");
        assert_eq!(pf.next_sequence(), 1);
        assert_eq!(pf.next_sequence(), 2);
        assert_eq!(pf.next_sequence(), 3);
    }
}
