pub mod document;
pub mod error;
pub mod notification;
pub mod tag;
pub mod variants;

pub use document::{CertValidationError, CertValidator, Document, Payload, PermissiveValidator};
pub use error::SecwError;
pub use notification::{Notification, NotificationAction, NOTIFICATIONS_TOPIC};
pub use tag::TagDescription;
pub use variants::{AuthProtocol, PrivProtocol, SecurityLevel};

/// Opaque document identifier, unique within a portfolio.
pub type Id = String;

/// Usage identifier, the capability label used by the access-control policy.
pub type UsageId = String;

/// Client identity as supplied by the transport layer.
pub type ClientId = String;

// ── Document Type ────────────────────────────────────────────────

/// The closed set of supported document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentType {
    Snmpv1,
    Snmpv3,
    UserAndPassword,
    LoginAndToken,
    TokenAndLogin,
    SshKeyAndLogin,
    ExternalCertificate,
    InternalCertificate,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        Self::Snmpv1,
        Self::Snmpv3,
        Self::UserAndPassword,
        Self::LoginAndToken,
        Self::TokenAndLogin,
        Self::SshKeyAndLogin,
        Self::ExternalCertificate,
        Self::InternalCertificate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Snmpv1 => "Snmpv1",
            Self::Snmpv3 => "Snmpv3",
            Self::UserAndPassword => "UserAndPassword",
            Self::LoginAndToken => "LoginAndToken",
            Self::TokenAndLogin => "TokenAndLogin",
            Self::SshKeyAndLogin => "SshKeyAndLogin",
            Self::ExternalCertificate => "ExternalCertificate",
            Self::InternalCertificate => "InternalCertificate",
        }
    }

    /// Parse a wire type string, rejecting anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self, SecwError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| SecwError::UnknownDocumentType {
                doc_type: s.to_string(),
            })
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = SecwError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_round_trip() {
        for t in DocumentType::ALL {
            assert_eq!(DocumentType::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn unknown_type_rejected() {
        let err = DocumentType::parse("Snmpv4").unwrap_err();
        assert_eq!(
            err,
            SecwError::UnknownDocumentType {
                doc_type: "Snmpv4".to_string()
            }
        );
    }
}
