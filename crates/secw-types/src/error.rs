use serde_json::{json, Value};

// ── Error taxonomy ───────────────────────────────────────────────
//
// Every variant maps to a stable numeric code on the wire. The envelope
// shape is { "errorCode": N, "whatArg": "...", "extraData": { ... } }.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecwError {
    #[error("command '{command}' is not supported")]
    UnsupportedCommand { command: String },

    #[error("protocol error: {reason}")]
    ProtocolError { reason: String },

    #[error("bad command argument: {reason}")]
    BadCommandArgument { reason: String },

    #[error("unknown portfolio '{portfolio}'")]
    UnknownPortfolio { portfolio: String },

    #[error("unknown tag '{tag}'")]
    UnknownTag { tag: String },

    #[error("unknown usage '{usage}'")]
    UnknownUsage { usage: String },

    #[error("action is not allowed: {reason}")]
    IllegalAction { reason: String },

    #[error("unknown document type '{doc_type}'")]
    UnknownDocumentType { doc_type: String },

    #[error("invalid document format in field '{field}'")]
    InvalidDocumentFormat { field: String },

    #[error("impossible to load portfolio '{portfolio}'")]
    ImpossibleToLoadPortfolio { portfolio: String },

    #[error("unknown client '{client}'")]
    UnknownClient { client: String },

    #[error("document '{id}' does not exist")]
    DocumentDoNotExist { id: String },

    #[error("name '{name}' already exists")]
    NameAlreadyExists { name: String },

    #[error("name '{name}' does not exist")]
    NameDoesNotExist { name: String },

    #[error("{reason}")]
    Unknown { reason: String },
}

impl SecwError {
    /// The stable wire code of this error.
    pub fn code(&self) -> u32 {
        match self {
            Self::UnsupportedCommand { .. } => 1,
            Self::ProtocolError { .. } => 2,
            Self::BadCommandArgument { .. } => 3,
            Self::UnknownPortfolio { .. } => 4,
            Self::UnknownTag { .. } => 5,
            Self::UnknownUsage { .. } => 6,
            Self::IllegalAction { .. } => 7,
            Self::UnknownDocumentType { .. } => 8,
            Self::InvalidDocumentFormat { .. } => 9,
            Self::ImpossibleToLoadPortfolio { .. } => 10,
            Self::UnknownClient { .. } => 11,
            Self::DocumentDoNotExist { .. } => 12,
            Self::NameAlreadyExists { .. } => 13,
            Self::NameDoesNotExist { .. } => 14,
            Self::Unknown { .. } => 99,
        }
    }

    /// Structured data carried next to the code, keyed per error kind.
    pub fn extra_data(&self) -> Value {
        match self {
            Self::UnknownPortfolio { portfolio } | Self::ImpossibleToLoadPortfolio { portfolio } => {
                json!({ "portfolio": portfolio })
            }
            Self::UnknownTag { tag } => json!({ "tag": tag }),
            Self::UnknownUsage { usage } => json!({ "usage": usage }),
            Self::UnknownDocumentType { doc_type } => json!({ "docType": doc_type }),
            Self::InvalidDocumentFormat { field } => json!({ "docField": field }),
            Self::DocumentDoNotExist { id } => json!({ "docId": id }),
            Self::NameAlreadyExists { name } | Self::NameDoesNotExist { name } => {
                json!({ "name": name })
            }
            _ => json!({}),
        }
    }

    /// The on-the-wire JSON envelope.
    pub fn to_envelope(&self) -> Value {
        json!({
            "errorCode": self.code(),
            "whatArg": self.to_string(),
            "extraData": self.extra_data(),
        })
    }

    /// Rebuild an error from a received envelope. Anything that does not
    /// decode cleanly comes back as `Unknown`.
    pub fn from_envelope(envelope: &Value) -> SecwError {
        let code = envelope.get("errorCode").and_then(Value::as_u64).unwrap_or(99);
        let what = envelope
            .get("whatArg")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let extra = |key: &str| -> String {
            envelope
                .get("extraData")
                .and_then(|d| d.get(key))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string()
        };

        match code {
            1 => Self::UnsupportedCommand { command: what },
            2 => Self::ProtocolError { reason: what },
            3 => Self::BadCommandArgument { reason: what },
            4 => Self::UnknownPortfolio {
                portfolio: extra("portfolio"),
            },
            5 => Self::UnknownTag { tag: extra("tag") },
            6 => Self::UnknownUsage {
                usage: extra("usage"),
            },
            7 => Self::IllegalAction { reason: what },
            8 => Self::UnknownDocumentType {
                doc_type: extra("docType"),
            },
            9 => Self::InvalidDocumentFormat {
                field: extra("docField"),
            },
            10 => Self::ImpossibleToLoadPortfolio {
                portfolio: extra("portfolio"),
            },
            11 => Self::UnknownClient { client: what },
            12 => Self::DocumentDoNotExist { id: extra("docId") },
            13 => Self::NameAlreadyExists { name: extra("name") },
            14 => Self::NameDoesNotExist { name: extra("name") },
            _ => Self::Unknown { reason: what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let cases: Vec<(SecwError, u32)> = vec![
            (
                SecwError::UnsupportedCommand {
                    command: "X".into(),
                },
                1,
            ),
            (SecwError::ProtocolError { reason: "x".into() }, 2),
            (
                SecwError::BadCommandArgument { reason: "x".into() },
                3,
            ),
            (
                SecwError::UnknownPortfolio {
                    portfolio: "p".into(),
                },
                4,
            ),
            (SecwError::UnknownTag { tag: "t".into() }, 5),
            (SecwError::UnknownUsage { usage: "u".into() }, 6),
            (SecwError::IllegalAction { reason: "x".into() }, 7),
            (
                SecwError::UnknownDocumentType {
                    doc_type: "T".into(),
                },
                8,
            ),
            (
                SecwError::InvalidDocumentFormat { field: "f".into() },
                9,
            ),
            (
                SecwError::ImpossibleToLoadPortfolio {
                    portfolio: "p".into(),
                },
                10,
            ),
            (SecwError::UnknownClient { client: "c".into() }, 11),
            (SecwError::DocumentDoNotExist { id: "i".into() }, 12),
            (SecwError::NameAlreadyExists { name: "n".into() }, 13),
            (SecwError::NameDoesNotExist { name: "n".into() }, 14),
            (SecwError::Unknown { reason: "x".into() }, 99),
        ];
        for (err, code) in cases {
            assert_eq!(err.code(), code, "{err:?}");
        }
    }

    #[test]
    fn envelope_round_trip() {
        let err = SecwError::InvalidDocumentFormat {
            field: "secw_user_and_password_username".into(),
        };
        let envelope = err.to_envelope();
        assert_eq!(envelope["errorCode"], 9);
        assert_eq!(
            envelope["extraData"]["docField"],
            "secw_user_and_password_username"
        );
        assert_eq!(SecwError::from_envelope(&envelope), err);
    }

    #[test]
    fn envelope_name_collision() {
        let err = SecwError::NameAlreadyExists { name: "A".into() };
        let envelope = err.to_envelope();
        assert_eq!(envelope["errorCode"], 13);
        assert_eq!(envelope["extraData"]["name"], "A");
        assert_eq!(SecwError::from_envelope(&envelope), err);
    }

    #[test]
    fn garbage_envelope_is_unknown() {
        let err = SecwError::from_envelope(&json!({ "nope": true }));
        assert_eq!(err.code(), 99);
    }
}
