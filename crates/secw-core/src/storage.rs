//! Atomic load/save of the document database.
//!
//! The file is a single JSON object `{ "version": N, "portfolios": [...] }`.
//! Writes go to a temporary file that is fsynced and atomically renamed over
//! the target, then the containing directory is fsynced, so a crash leaves
//! either the old or the new state, never a torn file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use secw_types::{CertValidator, Document, SecwError};

use crate::portfolio::Portfolio;

pub const DATABASE_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct DatabaseFile {
    version: u32,
    #[serde(default)]
    portfolios: Vec<PortfolioFile>,
}

#[derive(Serialize, Deserialize)]
struct PortfolioFile {
    name: String,
    #[serde(default)]
    documents: Vec<Value>,
}

/// Default data directory: ~/.security-wallet/
pub fn default_data_dir() -> PathBuf {
    dirs_home().join(".security-wallet")
}

/// Default database path: ~/.security-wallet/data.json
pub fn default_database_path() -> PathBuf {
    default_data_dir().join("data.json")
}

/// Default configuration path: ~/.security-wallet/configuration.json
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("configuration.json")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

fn io_err(what: &str, e: impl std::fmt::Display) -> SecwError {
    SecwError::Unknown {
        reason: format!("{what}: {e}"),
    }
}

/// Load the database. Documents that fail to parse or validate are skipped
/// with an operator-visible warning so one corrupted record cannot deny
/// service. Portfolios declared in the configuration but absent from the
/// file are created empty.
pub fn load_database(
    path: &Path,
    configured: &[String],
    certs: &dyn CertValidator,
) -> Result<Vec<Portfolio>, SecwError> {
    let mut portfolios: Vec<Portfolio> = Vec::new();

    if path.exists() {
        let file = fs::File::open(path).map_err(|e| io_err("failed to open database", e))?;
        let lock = RwLock::new(file);
        let _guard = lock
            .read()
            .map_err(|e| io_err("failed to acquire database read lock", e))?;
        drop(_guard);

        let contents =
            fs::read_to_string(path).map_err(|e| io_err("failed to read database", e))?;
        let parsed: DatabaseFile = serde_json::from_str(&contents)
            .map_err(|e| io_err("failed to parse database", e))?;

        for pf in parsed.portfolios {
            if portfolios.iter().any(|p| p.name == pf.name) {
                return Err(SecwError::ImpossibleToLoadPortfolio { portfolio: pf.name });
            }

            let mut documents: Vec<Document> = Vec::new();
            for value in &pf.documents {
                match load_document(value, certs) {
                    Ok(doc) => {
                        if documents.iter().any(|d| d.id == doc.id || d.name == doc.name) {
                            tracing::warn!(
                                portfolio = %pf.name,
                                id = %doc.id,
                                name = %doc.name,
                                "skipping document with duplicate id or name"
                            );
                        } else {
                            documents.push(doc);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            portfolio = %pf.name,
                            error = %e,
                            "skipping invalid document"
                        );
                    }
                }
            }
            portfolios.push(Portfolio::from_documents(pf.name, documents));
        }
    } else {
        tracing::info!(path = %path.display(), "no database file, starting empty");
    }

    for name in configured {
        if !portfolios.iter().any(|p| &p.name == name) {
            portfolios.push(Portfolio::new(name.clone()));
        }
    }
    for pf in &portfolios {
        if !configured.contains(&pf.name) {
            tracing::warn!(
                portfolio = %pf.name,
                "portfolio present in database but not in configuration"
            );
        }
    }

    Ok(portfolios)
}

fn load_document(value: &Value, certs: &dyn CertValidator) -> Result<Document, SecwError> {
    let mut doc = Document::from_value(value)?;
    // The stored form is authoritative; a record missing its private section
    // must not masquerade as complete.
    doc.contains_private = true;
    doc.validate(certs)?;
    Ok(doc)
}

/// Write the database using the crash-safe protocol: buffer, temp file with
/// fsync, atomic rename, directory fsync.
pub fn save_database(path: &Path, portfolios: &[Portfolio]) -> Result<(), SecwError> {
    let database = DatabaseFile {
        version: DATABASE_VERSION,
        portfolios: portfolios
            .iter()
            .map(|p| PortfolioFile {
                name: p.name.clone(),
                documents: p.documents().iter().map(Document::to_value).collect(),
            })
            .collect(),
    };

    let contents = serde_json::to_string_pretty(&database)
        .map_err(|e| io_err("failed to serialize database", e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| io_err("failed to create database directory", e))?;
    }

    let temp_path = path.with_extension("json.tmp");
    {
        let file = fs::File::create(&temp_path)
            .map_err(|e| io_err("failed to create temp file", e))?;

        let mut lock = RwLock::new(file);
        let mut guard = lock
            .write()
            .map_err(|e| io_err("failed to acquire database write lock", e))?;

        guard
            .write_all(contents.as_bytes())
            .map_err(|e| io_err("failed to write temp file", e))?;
        guard
            .flush()
            .map_err(|e| io_err("failed to flush temp file", e))?;
        guard
            .sync_all()
            .map_err(|e| io_err("failed to sync temp file", e))?;
    }

    fs::rename(&temp_path, path).map_err(|e| io_err("failed to rename temp file", e))?;

    if let Some(parent) = path.parent() {
        fs::File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| io_err("failed to sync database directory", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secw_types::{Payload, PermissiveValidator};
    use serde_json::json;

    fn sample_portfolio() -> Portfolio {
        let mut pf = Portfolio::new("default");
        let mut doc = Document::new("A", Payload::user_and_password("u", "p"));
        doc.add_usage("discovery_monitoring");
        pf.insert(doc, &PermissiveValidator).unwrap();
        pf.insert(
            Document::new("B", Payload::snmpv1("public")),
            &PermissiveValidator,
        )
        .unwrap();
        pf
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let pf = sample_portfolio();
        save_database(&path, std::slice::from_ref(&pf)).unwrap();
        assert!(!path.with_extension("json.tmp").exists());

        let loaded =
            load_database(&path, &["default".to_string()], &PermissiveValidator).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].len(), 2);
        assert_eq!(loaded[0].documents()[0].name, "A");
        assert_eq!(loaded[0].documents()[1].name, "B");
        assert!(loaded[0].documents()[0].contains_private);
        assert!(loaded[0]
            .documents()[0]
            .equals_private(pf.documents().first().unwrap()));
    }

    #[test]
    fn missing_file_creates_configured_portfolios() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let loaded = load_database(
            &path,
            &["default".to_string(), "spare".to_string()],
            &PermissiveValidator,
        )
        .unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|p| p.is_empty()));
    }

    #[test]
    fn invalid_document_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");

        let contents = json!({
            "version": 1,
            "portfolios": [{
                "name": "default",
                "documents": [
                    {
                        "secw_doc_id": "good",
                        "secw_doc_name": "ok",
                        "secw_doc_type": "Snmpv1",
                        "secw_doc_private": { "snmpv1_community_name": "public" }
                    },
                    {
                        "secw_doc_id": "bad",
                        "secw_doc_name": "broken",
                        "secw_doc_type": "UserAndPassword",
                        "secw_doc_public": { "secw_user_and_password_username": "u" }
                    }
                ]
            }]
        });
        fs::write(&path, contents.to_string()).unwrap();

        let loaded =
            load_database(&path, &["default".to_string()], &PermissiveValidator).unwrap();
        assert_eq!(loaded[0].len(), 1);
        assert_eq!(loaded[0].documents()[0].id, "good");
    }

    #[test]
    fn garbage_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, "not json").unwrap();

        let err =
            load_database(&path, &["default".to_string()], &PermissiveValidator).unwrap_err();
        assert_eq!(err.code(), 99);
    }

    #[test]
    fn duplicate_portfolio_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        let contents = json!({
            "version": 1,
            "portfolios": [
                { "name": "default", "documents": [] },
                { "name": "default", "documents": [] }
            ]
        });
        fs::write(&path, contents.to_string()).unwrap();

        let err =
            load_database(&path, &["default".to_string()], &PermissiveValidator).unwrap_err();
        assert_eq!(
            err,
            SecwError::ImpossibleToLoadPortfolio {
                portfolio: "default".into()
            }
        );
    }
}
