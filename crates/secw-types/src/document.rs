//! The document model: a common header plus one typed payload per supported
//! document type, split into a public half and a private (secret) half.
//!
//! The wire format is a JSON object carrying the `secw_doc_*` header keys and
//! two sub-objects, `secw_doc_public` and `secw_doc_private`. The private
//! sub-object is only present on the authoritative stored form; its presence
//! is what drives `contains_private` when parsing.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::variants::*;
use crate::{DocumentType, SecwError};

// ── Header wire keys ─────────────────────────────────────────────

pub const DOC_ID_ENTRY: &str = "secw_doc_id";
pub const DOC_NAME_ENTRY: &str = "secw_doc_name";
pub const DOC_TYPE_ENTRY: &str = "secw_doc_type";
pub const DOC_TAGS_ENTRY: &str = "secw_doc_tags";
pub const DOC_USAGES_ENTRY: &str = "secw_doc_usages";
pub const DOC_PUBLIC_ENTRY: &str = "secw_doc_public";
pub const DOC_PRIVATE_ENTRY: &str = "secw_doc_private";

// ── Certificate validation seam ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CertValidationError(pub String);

/// PEM material checks are delegated behind this trait so the document model
/// stays independent of any particular crypto library.
pub trait CertValidator: Send + Sync {
    fn validate_certificate(&self, cert_pem: &str) -> Result<(), CertValidationError>;

    /// Check that `key_pem` is a private key belonging to the certificate's
    /// public key.
    fn validate_key_pair(&self, cert_pem: &str, key_pem: &str)
        -> Result<(), CertValidationError>;
}

/// Accepts any PEM input without inspection. For tests and embedders that
/// validate certificate material elsewhere.
pub struct PermissiveValidator;

impl CertValidator for PermissiveValidator {
    fn validate_certificate(&self, _cert_pem: &str) -> Result<(), CertValidationError> {
        Ok(())
    }

    fn validate_key_pair(
        &self,
        _cert_pem: &str,
        _key_pem: &str,
    ) -> Result<(), CertValidationError> {
        Ok(())
    }
}

// ── Payload ──────────────────────────────────────────────────────

/// The typed variant payload of a document. One variant per supported type,
/// each holding its public and private halves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Snmpv1 {
        private: Snmpv1Private,
    },
    Snmpv3 {
        public: Snmpv3Public,
        private: Snmpv3Private,
    },
    UserAndPassword {
        public: UserAndPasswordPublic,
        private: UserAndPasswordPrivate,
    },
    LoginAndToken {
        public: LoginAndTokenPublic,
        private: LoginAndTokenPrivate,
    },
    TokenAndLogin {
        public: TokenAndLoginPublic,
        private: TokenAndLoginPrivate,
    },
    SshKeyAndLogin {
        public: SshKeyAndLoginPublic,
        private: SshKeyAndLoginPrivate,
    },
    ExternalCertificate {
        public: ExternalCertificatePublic,
    },
    InternalCertificate {
        public: InternalCertificatePublic,
        private: InternalCertificatePrivate,
    },
}

impl Payload {
    pub fn doc_type(&self) -> DocumentType {
        match self {
            Self::Snmpv1 { .. } => DocumentType::Snmpv1,
            Self::Snmpv3 { .. } => DocumentType::Snmpv3,
            Self::UserAndPassword { .. } => DocumentType::UserAndPassword,
            Self::LoginAndToken { .. } => DocumentType::LoginAndToken,
            Self::TokenAndLogin { .. } => DocumentType::TokenAndLogin,
            Self::SshKeyAndLogin { .. } => DocumentType::SshKeyAndLogin,
            Self::ExternalCertificate { .. } => DocumentType::ExternalCertificate,
            Self::InternalCertificate { .. } => DocumentType::InternalCertificate,
        }
    }

    /// Factory keyed on the type: an empty payload ready to be filled from
    /// the wire sub-objects.
    pub fn new_of_type(doc_type: DocumentType) -> Payload {
        match doc_type {
            DocumentType::Snmpv1 => Self::Snmpv1 {
                private: Default::default(),
            },
            DocumentType::Snmpv3 => Self::Snmpv3 {
                public: Default::default(),
                private: Default::default(),
            },
            DocumentType::UserAndPassword => Self::UserAndPassword {
                public: Default::default(),
                private: Default::default(),
            },
            DocumentType::LoginAndToken => Self::LoginAndToken {
                public: Default::default(),
                private: Default::default(),
            },
            DocumentType::TokenAndLogin => Self::TokenAndLogin {
                public: Default::default(),
                private: Default::default(),
            },
            DocumentType::SshKeyAndLogin => Self::SshKeyAndLogin {
                public: Default::default(),
                private: Default::default(),
            },
            DocumentType::ExternalCertificate => Self::ExternalCertificate {
                public: Default::default(),
            },
            DocumentType::InternalCertificate => Self::InternalCertificate {
                public: Default::default(),
                private: Default::default(),
            },
        }
    }

    // Convenience constructors.

    pub fn snmpv1(community: impl Into<String>) -> Payload {
        Self::Snmpv1 {
            private: Snmpv1Private {
                community: community.into(),
            },
        }
    }

    pub fn snmpv3(
        security_level: SecurityLevel,
        security_name: impl Into<String>,
        auth_protocol: AuthProtocol,
        auth_password: impl Into<String>,
        priv_protocol: PrivProtocol,
        priv_password: impl Into<String>,
    ) -> Payload {
        Self::Snmpv3 {
            public: Snmpv3Public {
                security_level,
                security_name: security_name.into(),
                auth_protocol,
                priv_protocol,
            },
            private: Snmpv3Private {
                auth_password: auth_password.into(),
                priv_password: priv_password.into(),
            },
        }
    }

    pub fn user_and_password(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Payload {
        Self::UserAndPassword {
            public: UserAndPasswordPublic {
                username: username.into(),
            },
            private: UserAndPasswordPrivate {
                password: password.into(),
            },
        }
    }

    pub fn login_and_token(login: impl Into<String>, token: impl Into<String>) -> Payload {
        Self::LoginAndToken {
            public: LoginAndTokenPublic {
                login: login.into(),
            },
            private: LoginAndTokenPrivate {
                token: token.into(),
            },
        }
    }

    pub fn token_and_login(login: impl Into<String>, token: impl Into<String>) -> Payload {
        Self::TokenAndLogin {
            public: TokenAndLoginPublic {
                login: login.into(),
            },
            private: TokenAndLoginPrivate {
                token: token.into(),
            },
        }
    }

    pub fn ssh_key_and_login(login: impl Into<String>, ssh_key: impl Into<String>) -> Payload {
        Self::SshKeyAndLogin {
            public: SshKeyAndLoginPublic {
                login: login.into(),
            },
            private: SshKeyAndLoginPrivate {
                ssh_key: ssh_key.into(),
            },
        }
    }

    pub fn external_certificate(pem: impl Into<String>) -> Payload {
        Self::ExternalCertificate {
            public: ExternalCertificatePublic { pem: pem.into() },
        }
    }

    pub fn internal_certificate(pem: impl Into<String>, key_pem: impl Into<String>) -> Payload {
        Self::InternalCertificate {
            public: InternalCertificatePublic { pem: pem.into() },
            private: InternalCertificatePrivate {
                key_pem: key_pem.into(),
            },
        }
    }

    pub(crate) fn emit_public(&self, out: &mut Map<String, Value>) {
        match self {
            Self::Snmpv1 { .. } => {}
            Self::Snmpv3 { public, .. } => public.emit(out),
            Self::UserAndPassword { public, .. } => public.emit(out),
            Self::LoginAndToken { public, .. } => public.emit(out),
            Self::TokenAndLogin { public, .. } => public.emit(out),
            Self::SshKeyAndLogin { public, .. } => public.emit(out),
            Self::ExternalCertificate { public } => public.emit(out),
            Self::InternalCertificate { public, .. } => public.emit(out),
        }
    }

    pub(crate) fn emit_private(&self, out: &mut Map<String, Value>) {
        match self {
            Self::Snmpv1 { private } => private.emit(out),
            Self::Snmpv3 { private, .. } => private.emit(out),
            Self::UserAndPassword { private, .. } => private.emit(out),
            Self::LoginAndToken { private, .. } => private.emit(out),
            Self::TokenAndLogin { private, .. } => private.emit(out),
            Self::SshKeyAndLogin { private, .. } => private.emit(out),
            Self::ExternalCertificate { .. } => {}
            Self::InternalCertificate { private, .. } => private.emit(out),
        }
    }

    pub(crate) fn apply_public(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        match self {
            Self::Snmpv1 { .. } => Ok(()),
            Self::Snmpv3 { public, .. } => public.apply(obj),
            Self::UserAndPassword { public, .. } => public.apply(obj),
            Self::LoginAndToken { public, .. } => public.apply(obj),
            Self::TokenAndLogin { public, .. } => public.apply(obj),
            Self::SshKeyAndLogin { public, .. } => public.apply(obj),
            Self::ExternalCertificate { public } => public.apply(obj),
            Self::InternalCertificate { public, .. } => public.apply(obj),
        }
    }

    pub(crate) fn apply_private(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        match self {
            Self::Snmpv1 { private } => private.apply(obj),
            Self::Snmpv3 { private, .. } => private.apply(obj),
            Self::UserAndPassword { private, .. } => private.apply(obj),
            Self::LoginAndToken { private, .. } => private.apply(obj),
            Self::TokenAndLogin { private, .. } => private.apply(obj),
            Self::SshKeyAndLogin { private, .. } => private.apply(obj),
            Self::ExternalCertificate { .. } => Ok(()),
            Self::InternalCertificate { private, .. } => private.apply(obj),
        }
    }

    /// Reset the private half to its empty state. Old secret values are
    /// zeroized on drop.
    pub(crate) fn clear_private(&mut self) {
        match self {
            Self::Snmpv1 { private } => *private = Default::default(),
            Self::Snmpv3 { private, .. } => *private = Default::default(),
            Self::UserAndPassword { private, .. } => *private = Default::default(),
            Self::LoginAndToken { private, .. } => *private = Default::default(),
            Self::TokenAndLogin { private, .. } => *private = Default::default(),
            Self::SshKeyAndLogin { private, .. } => *private = Default::default(),
            Self::ExternalCertificate { .. } => {}
            Self::InternalCertificate { private, .. } => *private = Default::default(),
        }
    }

    /// Copy the private half from `other` when both payloads are the same
    /// variant. Carries stored secrets through a metadata-only update.
    pub fn adopt_private_from(&mut self, other: &Payload) {
        match (self, other) {
            (Self::Snmpv1 { private }, Self::Snmpv1 { private: from }) => {
                *private = from.clone();
            }
            (Self::Snmpv3 { private, .. }, Self::Snmpv3 { private: from, .. }) => {
                *private = from.clone();
            }
            (
                Self::UserAndPassword { private, .. },
                Self::UserAndPassword { private: from, .. },
            ) => {
                *private = from.clone();
            }
            (Self::LoginAndToken { private, .. }, Self::LoginAndToken { private: from, .. }) => {
                *private = from.clone();
            }
            (Self::TokenAndLogin { private, .. }, Self::TokenAndLogin { private: from, .. }) => {
                *private = from.clone();
            }
            (
                Self::SshKeyAndLogin { private, .. },
                Self::SshKeyAndLogin { private: from, .. },
            ) => {
                *private = from.clone();
            }
            (
                Self::InternalCertificate { private, .. },
                Self::InternalCertificate { private: from, .. },
            ) => {
                *private = from.clone();
            }
            _ => {}
        }
    }

    /// Structural equality of the public halves. Different types never
    /// compare equal.
    pub fn equals_public(&self, other: &Payload) -> bool {
        match (self, other) {
            (Self::Snmpv1 { .. }, Self::Snmpv1 { .. }) => true,
            (Self::Snmpv3 { public: a, .. }, Self::Snmpv3 { public: b, .. }) => a == b,
            (Self::UserAndPassword { public: a, .. }, Self::UserAndPassword { public: b, .. }) => {
                a == b
            }
            (Self::LoginAndToken { public: a, .. }, Self::LoginAndToken { public: b, .. }) => {
                a == b
            }
            (Self::TokenAndLogin { public: a, .. }, Self::TokenAndLogin { public: b, .. }) => {
                a == b
            }
            (Self::SshKeyAndLogin { public: a, .. }, Self::SshKeyAndLogin { public: b, .. }) => {
                a == b
            }
            (Self::ExternalCertificate { public: a }, Self::ExternalCertificate { public: b }) => {
                a == b
            }
            (
                Self::InternalCertificate { public: a, .. },
                Self::InternalCertificate { public: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Structural equality of the private halves. A redacted copy (empty
    /// private half) never equals the full original unless the original had
    /// no secret content to begin with.
    pub fn equals_private(&self, other: &Payload) -> bool {
        match (self, other) {
            (Self::Snmpv1 { private: a }, Self::Snmpv1 { private: b }) => a == b,
            (Self::Snmpv3 { private: a, .. }, Self::Snmpv3 { private: b, .. }) => a == b,
            (
                Self::UserAndPassword { private: a, .. },
                Self::UserAndPassword { private: b, .. },
            ) => a == b,
            (Self::LoginAndToken { private: a, .. }, Self::LoginAndToken { private: b, .. }) => {
                a == b
            }
            (Self::TokenAndLogin { private: a, .. }, Self::TokenAndLogin { private: b, .. }) => {
                a == b
            }
            (
                Self::SshKeyAndLogin { private: a, .. },
                Self::SshKeyAndLogin { private: b, .. },
            ) => a == b,
            (Self::ExternalCertificate { .. }, Self::ExternalCertificate { .. }) => true,
            (
                Self::InternalCertificate { private: a, .. },
                Self::InternalCertificate { private: b, .. },
            ) => a == b,
            _ => false,
        }
    }

    /// Variant-specific required-field checks. Private-side requirements only
    /// apply on the authoritative form (`contains_private` true), so redacted
    /// copies of otherwise-valid documents stay valid.
    pub fn validate(
        &self,
        contains_private: bool,
        certs: &dyn CertValidator,
    ) -> Result<(), SecwError> {
        fn require(ok: bool, field: &str) -> Result<(), SecwError> {
            if ok {
                Ok(())
            } else {
                Err(SecwError::InvalidDocumentFormat {
                    field: field.to_string(),
                })
            }
        }

        match self {
            Self::Snmpv1 { private } => {
                if contains_private {
                    require(!private.community.is_empty(), SNMPV1_COMMUNITY_NAME)?;
                }
            }
            Self::Snmpv3 { public, private } => {
                if public.security_level != SecurityLevel::NoAuthNoPriv {
                    require(!public.security_name.is_empty(), SNMPV3_SECURITY_NAME)?;
                }
                if contains_private {
                    if public.security_level != SecurityLevel::NoAuthNoPriv {
                        require(!private.auth_password.is_empty(), SNMPV3_AUTH_PASSWORD)?;
                    }
                    if public.security_level == SecurityLevel::AuthPriv {
                        require(!private.priv_password.is_empty(), SNMPV3_PRIV_PASSWORD)?;
                    }
                }
            }
            Self::UserAndPassword { public, private } => {
                require(!public.username.is_empty(), USER_AND_PASSWORD_USERNAME)?;
                if contains_private {
                    require(!private.password.is_empty(), USER_AND_PASSWORD_PASSWORD)?;
                }
            }
            Self::LoginAndToken { private, .. } => {
                if contains_private {
                    require(!private.token.is_empty(), LOGIN_AND_TOKEN_TOKEN)?;
                }
            }
            Self::TokenAndLogin { private, .. } => {
                if contains_private {
                    require(!private.token.is_empty(), TOKEN_AND_LOGIN_TOKEN)?;
                }
            }
            Self::SshKeyAndLogin { private, .. } => {
                if contains_private {
                    require(!private.ssh_key.is_empty(), SSHKEY_AND_LOGIN_SSHKEY)?;
                }
            }
            Self::ExternalCertificate { public } => {
                require(!public.pem.is_empty(), EXTERNAL_CERTIFICATE_PEM)?;
                certs.validate_certificate(&public.pem).map_err(|_| {
                    SecwError::InvalidDocumentFormat {
                        field: EXTERNAL_CERTIFICATE_PEM.into(),
                    }
                })?;
            }
            Self::InternalCertificate { public, private } => {
                require(!public.pem.is_empty(), INTERNAL_CERTIFICATE_PEM)?;
                if contains_private {
                    require(!private.key_pem.is_empty(), INTERNAL_CERTIFICATE_KEY_PEM)?;
                    certs
                        .validate_key_pair(&public.pem, &private.key_pem)
                        .map_err(|_| SecwError::InvalidDocumentFormat {
                            field: INTERNAL_CERTIFICATE_KEY_PEM.into(),
                        })?;
                } else {
                    certs.validate_certificate(&public.pem).map_err(|_| {
                        SecwError::InvalidDocumentFormat {
                            field: INTERNAL_CERTIFICATE_PEM.into(),
                        }
                    })?;
                }
            }
        }
        Ok(())
    }
}

// ── Document ─────────────────────────────────────────────────────

/// A credential record: common header plus typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Server-assigned on insert, immutable afterwards.
    pub id: String,
    /// Unique within a portfolio, mutable.
    pub name: String,
    /// Insertion-ordered labels, duplicates rejected at parse time.
    pub tags: Vec<String>,
    /// Capability labels driving the access-control policy.
    pub usages: BTreeSet<String>,
    /// True on the authoritative stored form; false on redacted copies.
    pub contains_private: bool,
    pub payload: Payload,
}

impl Document {
    pub fn new(name: impl Into<String>, payload: Payload) -> Document {
        Document {
            id: String::new(),
            name: name.into(),
            tags: Vec::new(),
            usages: BTreeSet::new(),
            contains_private: true,
            payload,
        }
    }

    pub fn doc_type(&self) -> DocumentType {
        self.payload.doc_type()
    }

    pub fn add_usage(&mut self, usage: impl Into<String>) {
        self.usages.insert(usage.into());
    }

    /// Append a tag, preserving insertion order. Duplicates are rejected.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> Result<(), SecwError> {
        let tag = tag.into();
        if self.tags.contains(&tag) {
            return Err(SecwError::InvalidDocumentFormat {
                field: DOC_TAGS_ENTRY.into(),
            });
        }
        self.tags.push(tag);
        Ok(())
    }

    /// A fresh copy safe to hand to producers: `contains_private` is false
    /// and every secret field is reset. Redaction always produces a new
    /// value rather than suppressing fields during serialization.
    pub fn redacted(&self) -> Document {
        let mut copy = self.clone();
        copy.contains_private = false;
        copy.payload.clear_private();
        copy
    }

    /// Check the variant-specific required fields. Certificate material goes
    /// through the supplied validator.
    pub fn validate(&self, certs: &dyn CertValidator) -> Result<(), SecwError> {
        if self.name.is_empty() {
            return Err(SecwError::InvalidDocumentFormat {
                field: DOC_NAME_ENTRY.into(),
            });
        }
        self.payload.validate(self.contains_private, certs)
    }

    /// Structural equality of the public payload halves only. The header
    /// (name, tags, usages) is compared separately by callers that need it.
    pub fn equals_public(&self, other: &Document) -> bool {
        self.payload.equals_public(&other.payload)
    }

    /// Structural equality of the private payload halves only.
    pub fn equals_private(&self, other: &Document) -> bool {
        self.payload.equals_private(&other.payload)
    }

    /// The wire JSON object. The private sub-object is emitted only for the
    /// authoritative form; a redacted document physically has no secrets to
    /// emit either way.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        write_string(&mut root, DOC_ID_ENTRY, &self.id);
        write_string(&mut root, DOC_NAME_ENTRY, &self.name);
        root.insert(
            DOC_TYPE_ENTRY.to_string(),
            Value::String(self.doc_type().as_str().to_string()),
        );
        root.insert(
            DOC_TAGS_ENTRY.to_string(),
            Value::Array(self.tags.iter().cloned().map(Value::String).collect()),
        );
        root.insert(
            DOC_USAGES_ENTRY.to_string(),
            Value::Array(self.usages.iter().cloned().map(Value::String).collect()),
        );

        let mut public = Map::new();
        self.payload.emit_public(&mut public);
        root.insert(DOC_PUBLIC_ENTRY.to_string(), Value::Object(public));

        if self.contains_private {
            let mut private = Map::new();
            self.payload.emit_private(&mut private);
            root.insert(DOC_PRIVATE_ENTRY.to_string(), Value::Object(private));
        }

        Value::Object(root)
    }

    /// Parse a wire JSON object. Unknown members are ignored; recognized
    /// members of the wrong shape fail with the offending field.
    pub fn from_value(value: &Value) -> Result<Document, SecwError> {
        let root = value.as_object().ok_or_else(|| SecwError::ProtocolError {
            reason: "document is not a JSON object".into(),
        })?;

        let type_str =
            read_string(root, DOC_TYPE_ENTRY)?.ok_or_else(|| SecwError::InvalidDocumentFormat {
                field: DOC_TYPE_ENTRY.into(),
            })?;
        let doc_type = DocumentType::parse(&type_str)?;

        let mut doc = Document {
            id: read_string(root, DOC_ID_ENTRY)?.unwrap_or_default(),
            name: read_string(root, DOC_NAME_ENTRY)?.unwrap_or_default(),
            tags: Vec::new(),
            usages: BTreeSet::new(),
            contains_private: false,
            payload: Payload::new_of_type(doc_type),
        };

        for tag in read_string_array(root, DOC_TAGS_ENTRY)? {
            doc.add_tag(tag)?;
        }
        doc.usages = read_string_array(root, DOC_USAGES_ENTRY)?.into_iter().collect();

        match root.get(DOC_PUBLIC_ENTRY) {
            None => {}
            Some(Value::Object(obj)) => doc.payload.apply_public(obj)?,
            Some(_) => {
                return Err(SecwError::InvalidDocumentFormat {
                    field: DOC_PUBLIC_ENTRY.into(),
                })
            }
        }

        match root.get(DOC_PRIVATE_ENTRY) {
            None => {}
            Some(Value::Object(obj)) => {
                doc.contains_private = true;
                doc.payload.apply_private(obj)?;
            }
            Some(_) => {
                return Err(SecwError::InvalidDocumentFormat {
                    field: DOC_PRIVATE_ENTRY.into(),
                })
            }
        }

        Ok(doc)
    }
}

fn read_string_array(obj: &Map<String, Value>, key: &'static str) -> Result<Vec<String>, SecwError> {
    match obj.get(key) {
        None => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SecwError::InvalidDocumentFormat { field: key.into() }),
            })
            .collect(),
        Some(_) => Err(SecwError::InvalidDocumentFormat { field: key.into() }),
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Document::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_doc() -> Document {
        let mut doc = Document::new("pdu-admin", Payload::user_and_password("admin", "s3cret"));
        doc.id = "11-22-33".into();
        doc.add_usage("discovery_monitoring");
        doc.add_tag("rack-1").unwrap();
        doc.add_tag("rack-2").unwrap();
        doc
    }

    #[test]
    fn serialize_parse_round_trip() {
        let doc = sample_doc();
        let value = doc.to_value();

        assert_eq!(value[DOC_ID_ENTRY], "11-22-33");
        assert_eq!(value[DOC_NAME_ENTRY], "pdu-admin");
        assert_eq!(value[DOC_TYPE_ENTRY], "UserAndPassword");
        assert_eq!(value[DOC_TAGS_ENTRY], json!(["rack-1", "rack-2"]));
        assert_eq!(value[DOC_USAGES_ENTRY], json!(["discovery_monitoring"]));
        assert_eq!(
            value[DOC_PUBLIC_ENTRY][USER_AND_PASSWORD_USERNAME],
            "admin"
        );
        assert_eq!(
            value[DOC_PRIVATE_ENTRY][USER_AND_PASSWORD_PASSWORD],
            "s3cret"
        );

        let parsed = Document::from_value(&value).unwrap();
        assert!(parsed.contains_private);
        assert!(parsed.equals_public(&doc));
        assert!(parsed.equals_private(&doc));
        assert_eq!(parsed, doc);
    }

    #[test]
    fn clone_fidelity() {
        let doc = sample_doc();
        let copy = doc.clone();
        assert!(copy.equals_public(&doc));
        assert!(copy.equals_private(&doc));
    }

    #[test]
    fn redaction_clears_secrets() {
        let doc = sample_doc();
        let redacted = doc.redacted();

        assert!(!redacted.contains_private);
        assert!(redacted.equals_public(&doc));
        assert!(!redacted.equals_private(&doc));

        // A redacted document is secret-equal to an empty document of the
        // same type.
        let empty = Document::new("empty", Payload::new_of_type(DocumentType::UserAndPassword));
        assert!(redacted.equals_private(&empty));

        // No private sub-object on the wire.
        let value = redacted.to_value();
        assert!(value.get(DOC_PRIVATE_ENTRY).is_none());
        let text = serde_json::to_string(&value).unwrap();
        assert!(!text.contains("s3cret"));
    }

    #[test]
    fn parse_without_private_section() {
        let mut value = sample_doc().to_value();
        value.as_object_mut().unwrap().remove(DOC_PRIVATE_ENTRY);

        let parsed = Document::from_value(&value).unwrap();
        assert!(!parsed.contains_private);
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let value = json!({ DOC_TYPE_ENTRY: "FloppyDisk" });
        let err = Document::from_value(&value).unwrap_err();
        assert_eq!(
            err,
            SecwError::UnknownDocumentType {
                doc_type: "FloppyDisk".into()
            }
        );
    }

    #[test]
    fn parse_rejects_duplicate_tags() {
        let value = json!({
            DOC_TYPE_ENTRY: "Snmpv1",
            DOC_NAME_ENTRY: "dup",
            DOC_TAGS_ENTRY: ["a", "a"],
        });
        let err = Document::from_value(&value).unwrap_err();
        assert_eq!(
            err,
            SecwError::InvalidDocumentFormat {
                field: DOC_TAGS_ENTRY.into()
            }
        );
    }

    #[test]
    fn validate_user_and_password() {
        let certs = PermissiveValidator;

        let doc = Document::new("ok", Payload::user_and_password("u", "p"));
        doc.validate(&certs).unwrap();

        let doc = Document::new("no-user", Payload::user_and_password("", "p"));
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: USER_AND_PASSWORD_USERNAME.into()
            }
        );

        let doc = Document::new("no-pass", Payload::user_and_password("u", ""));
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: USER_AND_PASSWORD_PASSWORD.into()
            }
        );

        // A redacted copy keeps only the public requirements.
        let doc = Document::new("ok", Payload::user_and_password("u", "p")).redacted();
        doc.validate(&certs).unwrap();
    }

    #[test]
    fn validate_snmpv3_levels() {
        let certs = PermissiveValidator;

        let doc = Document::new(
            "open",
            Payload::snmpv3(
                SecurityLevel::NoAuthNoPriv,
                "",
                AuthProtocol::Md5,
                "",
                PrivProtocol::Des,
                "",
            ),
        );
        doc.validate(&certs).unwrap();

        let doc = Document::new(
            "auth-no-name",
            Payload::snmpv3(
                SecurityLevel::AuthNoPriv,
                "",
                AuthProtocol::Sha,
                "pw",
                PrivProtocol::Des,
                "",
            ),
        );
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: SNMPV3_SECURITY_NAME.into()
            }
        );

        let doc = Document::new(
            "auth-priv-no-priv-pw",
            Payload::snmpv3(
                SecurityLevel::AuthPriv,
                "sec",
                AuthProtocol::Sha,
                "pw",
                PrivProtocol::Aes,
                "",
            ),
        );
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: SNMPV3_PRIV_PASSWORD.into()
            }
        );
    }

    #[test]
    fn validate_snmpv1_and_tokens() {
        let certs = PermissiveValidator;

        let doc = Document::new("v1", Payload::snmpv1(""));
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: SNMPV1_COMMUNITY_NAME.into()
            }
        );

        let doc = Document::new("lt", Payload::login_and_token("bot", ""));
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: LOGIN_AND_TOKEN_TOKEN.into()
            }
        );

        let doc = Document::new("ssh", Payload::ssh_key_and_login("ops", ""));
        assert_eq!(
            doc.validate(&certs).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: SSHKEY_AND_LOGIN_SSHKEY.into()
            }
        );

        // Redacted token documents carry no private requirement.
        Document::new("lt", Payload::login_and_token("bot", "t"))
            .redacted()
            .validate(&certs)
            .unwrap();
    }

    #[test]
    fn validate_requires_name() {
        let doc = Document::new("", Payload::snmpv1("public"));
        assert_eq!(
            doc.validate(&PermissiveValidator).unwrap_err(),
            SecwError::InvalidDocumentFormat {
                field: DOC_NAME_ENTRY.into()
            }
        );
    }

    #[test]
    fn equals_across_types_is_false() {
        let a = Document::new("a", Payload::login_and_token("x", "t"));
        let b = Document::new("a", Payload::token_and_login("x", "t"));
        assert!(!a.equals_public(&b));
        assert!(!a.equals_private(&b));
    }

    #[test]
    fn serde_impls_match_wire_format() {
        let doc = sample_doc();
        let text = serde_json::to_string(&doc).unwrap();
        let parsed: Document = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, doc);
    }
}
