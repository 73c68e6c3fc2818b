//! Per-type payload structs and their wire fields.
//!
//! Every document type splits into a public struct (metadata, safe to show to
//! producers) and a private struct (secret material, consumer-only). Private
//! structs zeroize their contents on drop.

use serde_json::{Map, Value};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::SecwError;

// ── Wire keys ────────────────────────────────────────────────────

pub const SNMPV1_COMMUNITY_NAME: &str = "snmpv1_community_name";

pub const SNMPV3_SECURITY_LEVEL: &str = "secw_snmpv3_security_level";
pub const SNMPV3_SECURITY_NAME: &str = "secw_snmpv3_security_name";
pub const SNMPV3_AUTH_PROTOCOL: &str = "secw_snmpv3_auth_protocol";
pub const SNMPV3_AUTH_PASSWORD: &str = "secw_snmpv3_auth_password";
pub const SNMPV3_PRIV_PROTOCOL: &str = "secw_snmpv3_priv_protocol";
pub const SNMPV3_PRIV_PASSWORD: &str = "secw_snmpv3_priv_password";

pub const USER_AND_PASSWORD_USERNAME: &str = "secw_user_and_password_username";
pub const USER_AND_PASSWORD_PASSWORD: &str = "secw_user_and_password_password";

pub const LOGIN_AND_TOKEN_LOGIN: &str = "secw_login_and_token_login";
pub const LOGIN_AND_TOKEN_TOKEN: &str = "secw_login_and_token_token";

pub const TOKEN_AND_LOGIN_LOGIN: &str = "secw_token_and_login_login";
pub const TOKEN_AND_LOGIN_TOKEN: &str = "secw_token_and_login_token";

pub const SSHKEY_AND_LOGIN_LOGIN: &str = "secw_sshkey_and_login_login";
pub const SSHKEY_AND_LOGIN_SSHKEY: &str = "secw_sshkey_and_login_sshkey";

pub const EXTERNAL_CERTIFICATE_PEM: &str = "secw_external_certificate_pem";
pub const INTERNAL_CERTIFICATE_PEM: &str = "secw_internal_certificate_pem";
pub const INTERNAL_CERTIFICATE_KEY_PEM: &str = "secw_internal_certificate_key_pem";

// ── Field helpers ────────────────────────────────────────────────

/// Read an optional string member; present-but-not-a-string is a format error
/// attributed to the field.
pub(crate) fn read_string(
    obj: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, SecwError> {
    match obj.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SecwError::InvalidDocumentFormat { field: key.into() }),
    }
}

pub(crate) fn read_u8(obj: &Map<String, Value>, key: &'static str) -> Result<Option<u8>, SecwError> {
    match obj.get(key) {
        None => Ok(None),
        Some(v) => match v.as_u64() {
            Some(n) if n <= u8::MAX as u64 => Ok(Some(n as u8)),
            _ => Err(SecwError::InvalidDocumentFormat { field: key.into() }),
        },
    }
}

/// Insert a string member, omitting empty values.
pub(crate) fn write_string(out: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        out.insert(key.to_string(), Value::String(value.to_string()));
    }
}

// ── SNMPv3 enumerations ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityLevel {
    #[default]
    NoAuthNoPriv = 0,
    AuthNoPriv = 1,
    AuthPriv = 2,
}

impl TryFrom<u8> for SecurityLevel {
    type Error = SecwError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::NoAuthNoPriv),
            1 => Ok(Self::AuthNoPriv),
            2 => Ok(Self::AuthPriv),
            _ => Err(SecwError::InvalidDocumentFormat {
                field: SNMPV3_SECURITY_LEVEL.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthProtocol {
    #[default]
    Md5 = 0,
    Sha = 1,
    Sha256 = 2,
    Sha384 = 3,
    Sha512 = 4,
}

impl TryFrom<u8> for AuthProtocol {
    type Error = SecwError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Md5),
            1 => Ok(Self::Sha),
            2 => Ok(Self::Sha256),
            3 => Ok(Self::Sha384),
            4 => Ok(Self::Sha512),
            _ => Err(SecwError::InvalidDocumentFormat {
                field: SNMPV3_AUTH_PROTOCOL.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivProtocol {
    #[default]
    Des = 0,
    Aes = 1,
    Aes192 = 2,
    Aes256 = 3,
}

impl TryFrom<u8> for PrivProtocol {
    type Error = SecwError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Des),
            1 => Ok(Self::Aes),
            2 => Ok(Self::Aes192),
            3 => Ok(Self::Aes256),
            _ => Err(SecwError::InvalidDocumentFormat {
                field: SNMPV3_PRIV_PROTOCOL.into(),
            }),
        }
    }
}

// ── Snmpv1 ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Snmpv1Private {
    pub community: String,
}

impl Snmpv1Private {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, SNMPV1_COMMUNITY_NAME, &self.community);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, SNMPV1_COMMUNITY_NAME)? {
            self.community = v;
        }
        Ok(())
    }
}

// ── Snmpv3 ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snmpv3Public {
    pub security_level: SecurityLevel,
    pub security_name: String,
    pub auth_protocol: AuthProtocol,
    pub priv_protocol: PrivProtocol,
}

impl Snmpv3Public {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        out.insert(
            SNMPV3_SECURITY_LEVEL.to_string(),
            Value::from(self.security_level as u8),
        );
        write_string(out, SNMPV3_SECURITY_NAME, &self.security_name);
        out.insert(
            SNMPV3_AUTH_PROTOCOL.to_string(),
            Value::from(self.auth_protocol as u8),
        );
        out.insert(
            SNMPV3_PRIV_PROTOCOL.to_string(),
            Value::from(self.priv_protocol as u8),
        );
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_u8(obj, SNMPV3_SECURITY_LEVEL)? {
            self.security_level = SecurityLevel::try_from(v)?;
        }
        if let Some(v) = read_string(obj, SNMPV3_SECURITY_NAME)? {
            self.security_name = v;
        }
        if let Some(v) = read_u8(obj, SNMPV3_AUTH_PROTOCOL)? {
            self.auth_protocol = AuthProtocol::try_from(v)?;
        }
        if let Some(v) = read_u8(obj, SNMPV3_PRIV_PROTOCOL)? {
            self.priv_protocol = PrivProtocol::try_from(v)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Snmpv3Private {
    pub auth_password: String,
    pub priv_password: String,
}

impl Snmpv3Private {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, SNMPV3_AUTH_PASSWORD, &self.auth_password);
        write_string(out, SNMPV3_PRIV_PASSWORD, &self.priv_password);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, SNMPV3_AUTH_PASSWORD)? {
            self.auth_password = v;
        }
        if let Some(v) = read_string(obj, SNMPV3_PRIV_PASSWORD)? {
            self.priv_password = v;
        }
        Ok(())
    }
}

// ── UserAndPassword ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAndPasswordPublic {
    pub username: String,
}

impl UserAndPasswordPublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, USER_AND_PASSWORD_USERNAME, &self.username);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, USER_AND_PASSWORD_USERNAME)? {
            self.username = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct UserAndPasswordPrivate {
    pub password: String,
}

impl UserAndPasswordPrivate {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, USER_AND_PASSWORD_PASSWORD, &self.password);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, USER_AND_PASSWORD_PASSWORD)? {
            self.password = v;
        }
        Ok(())
    }
}

// ── LoginAndToken ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginAndTokenPublic {
    pub login: String,
}

impl LoginAndTokenPublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, LOGIN_AND_TOKEN_LOGIN, &self.login);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, LOGIN_AND_TOKEN_LOGIN)? {
            self.login = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct LoginAndTokenPrivate {
    pub token: String,
}

impl LoginAndTokenPrivate {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, LOGIN_AND_TOKEN_TOKEN, &self.token);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, LOGIN_AND_TOKEN_TOKEN)? {
            self.token = v;
        }
        Ok(())
    }
}

// ── TokenAndLogin ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenAndLoginPublic {
    pub login: String,
}

impl TokenAndLoginPublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, TOKEN_AND_LOGIN_LOGIN, &self.login);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, TOKEN_AND_LOGIN_LOGIN)? {
            self.login = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct TokenAndLoginPrivate {
    pub token: String,
}

impl TokenAndLoginPrivate {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, TOKEN_AND_LOGIN_TOKEN, &self.token);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, TOKEN_AND_LOGIN_TOKEN)? {
            self.token = v;
        }
        Ok(())
    }
}

// ── SshKeyAndLogin ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshKeyAndLoginPublic {
    pub login: String,
}

impl SshKeyAndLoginPublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, SSHKEY_AND_LOGIN_LOGIN, &self.login);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, SSHKEY_AND_LOGIN_LOGIN)? {
            self.login = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SshKeyAndLoginPrivate {
    pub ssh_key: String,
}

impl SshKeyAndLoginPrivate {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, SSHKEY_AND_LOGIN_SSHKEY, &self.ssh_key);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, SSHKEY_AND_LOGIN_SSHKEY)? {
            self.ssh_key = v;
        }
        Ok(())
    }
}

// ── ExternalCertificate ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCertificatePublic {
    pub pem: String,
}

impl ExternalCertificatePublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, EXTERNAL_CERTIFICATE_PEM, &self.pem);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, EXTERNAL_CERTIFICATE_PEM)? {
            self.pem = v;
        }
        Ok(())
    }
}

// ── InternalCertificate ──────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternalCertificatePublic {
    pub pem: String,
}

impl InternalCertificatePublic {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, INTERNAL_CERTIFICATE_PEM, &self.pem);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, INTERNAL_CERTIFICATE_PEM)? {
            self.pem = v;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct InternalCertificatePrivate {
    pub key_pem: String,
}

impl InternalCertificatePrivate {
    pub(crate) fn emit(&self, out: &mut Map<String, Value>) {
        write_string(out, INTERNAL_CERTIFICATE_KEY_PEM, &self.key_pem);
    }

    pub(crate) fn apply(&mut self, obj: &Map<String, Value>) -> Result<(), SecwError> {
        if let Some(v) = read_string(obj, INTERNAL_CERTIFICATE_KEY_PEM)? {
            self.key_pem = v;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn security_level_wire_values() {
        assert_eq!(SecurityLevel::try_from(0).unwrap(), SecurityLevel::NoAuthNoPriv);
        assert_eq!(SecurityLevel::try_from(1).unwrap(), SecurityLevel::AuthNoPriv);
        assert_eq!(SecurityLevel::try_from(2).unwrap(), SecurityLevel::AuthPriv);
        assert!(SecurityLevel::try_from(3).is_err());
        assert_eq!(SecurityLevel::AuthPriv as u8, 2);
    }

    #[test]
    fn auth_protocol_wire_values() {
        for (n, p) in [
            (0u8, AuthProtocol::Md5),
            (1, AuthProtocol::Sha),
            (2, AuthProtocol::Sha256),
            (3, AuthProtocol::Sha384),
            (4, AuthProtocol::Sha512),
        ] {
            assert_eq!(AuthProtocol::try_from(n).unwrap(), p);
            assert_eq!(p as u8, n);
        }
        assert!(AuthProtocol::try_from(5).is_err());
    }

    #[test]
    fn priv_protocol_wire_values() {
        for (n, p) in [
            (0u8, PrivProtocol::Des),
            (1, PrivProtocol::Aes),
            (2, PrivProtocol::Aes192),
            (3, PrivProtocol::Aes256),
        ] {
            assert_eq!(PrivProtocol::try_from(n).unwrap(), p);
            assert_eq!(p as u8, n);
        }
        assert!(PrivProtocol::try_from(4).is_err());
    }

    #[test]
    fn apply_ignores_unknown_fields() {
        let obj = json!({
            "secw_user_and_password_username": "admin",
            "some_future_field": 42,
        });
        let mut public = UserAndPasswordPublic::default();
        public.apply(obj.as_object().unwrap()).unwrap();
        assert_eq!(public.username, "admin");
    }

    #[test]
    fn apply_rejects_wrong_type() {
        let obj = json!({ "secw_user_and_password_username": 42 });
        let mut public = UserAndPasswordPublic::default();
        let err = public.apply(obj.as_object().unwrap()).unwrap_err();
        assert_eq!(
            err,
            SecwError::InvalidDocumentFormat {
                field: USER_AND_PASSWORD_USERNAME.into()
            }
        );
    }

    #[test]
    fn emit_omits_empty_fields() {
        let mut out = Map::new();
        UserAndPasswordPrivate::default().emit(&mut out);
        assert!(out.is_empty());

        let mut out = Map::new();
        UserAndPasswordPrivate {
            password: "p".into(),
        }
        .emit(&mut out);
        assert_eq!(out.get(USER_AND_PASSWORD_PASSWORD), Some(&json!("p")));
    }

    #[test]
    fn snmpv3_public_round_trip() {
        let public = Snmpv3Public {
            security_level: SecurityLevel::AuthPriv,
            security_name: "netmon".into(),
            auth_protocol: AuthProtocol::Sha256,
            priv_protocol: PrivProtocol::Aes256,
        };
        let mut out = Map::new();
        public.emit(&mut out);
        assert_eq!(out.get(SNMPV3_SECURITY_LEVEL), Some(&json!(2)));
        assert_eq!(out.get(SNMPV3_AUTH_PROTOCOL), Some(&json!(2)));

        let mut parsed = Snmpv3Public::default();
        parsed.apply(&out).unwrap();
        assert_eq!(parsed, public);
    }
}
