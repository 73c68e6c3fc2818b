pub mod certs;
pub mod config;
pub mod notify;
pub mod portfolio;
pub mod protocol;
pub mod storage;
pub mod watcher;

pub use certs::X509CertValidator;
pub use config::{AccessMethod, ClientRole, SecurityConfig};
pub use notify::{NotificationPublisher, NotificationStream};
pub use portfolio::Portfolio;
pub use protocol::{command, Request, Response};

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;

use secw_types::{
    CertValidator, Document, DocumentType, Id, Notification, SecwError, TagDescription, UsageId,
};

// ── Wallet (thread-safe handle) ──────────────────────────────────

/// The wallet core: one shared in-memory document store behind a
/// reader-writer lock, with durable persistence and a notification stream.
/// Cloning the handle is cheap; all clones see the same wallet.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<RwLock<WalletInner>>,
    publisher: NotificationPublisher,
    certs: Arc<dyn CertValidator>,
}

struct WalletInner {
    config_path: PathBuf,
    database_path: PathBuf,
    config: SecurityConfig,
    portfolios: Vec<Portfolio>,
}

impl Wallet {
    /// Load the configuration and the database. Either failing is fatal, as
    /// a wallet serving without its access policy or its data would be.
    pub fn open(
        config_path: PathBuf,
        database_path: PathBuf,
        certs: Arc<dyn CertValidator>,
    ) -> Result<Wallet, SecwError> {
        let config = SecurityConfig::load(&config_path)?;
        let portfolios =
            storage::load_database(&database_path, config.portfolio_names(), certs.as_ref())?;

        tracing::info!(
            portfolios = portfolios.len(),
            documents = portfolios.iter().map(Portfolio::len).sum::<usize>(),
            "security wallet opened"
        );

        Ok(Wallet {
            inner: Arc::new(RwLock::new(WalletInner {
                config_path,
                database_path,
                config,
                portfolios,
            })),
            publisher: NotificationPublisher::default(),
            certs,
        })
    }

    pub async fn config_path(&self) -> PathBuf {
        self.inner.read().await.config_path.clone()
    }

    /// Re-read the configuration file. On a parse failure the previous
    /// configuration stays in effect and the error is returned to the
    /// caller. Newly configured portfolios appear empty.
    pub async fn reload_config(&self) -> Result<(), SecwError> {
        let path = self.inner.read().await.config_path.clone();
        let config = SecurityConfig::load(&path)?;

        let mut inner = self.inner.write().await;
        for name in config.portfolio_names() {
            if !inner.portfolios.iter().any(|p| &p.name == name) {
                inner.portfolios.push(Portfolio::new(name.clone()));
            }
        }
        inner.config = config;
        tracing::info!("configuration reloaded");
        Ok(())
    }

    /// Subscribe to the change-notification stream.
    pub fn subscribe(&self) -> NotificationStream {
        self.publisher.subscribe()
    }

    /// Events lost to slow subscribers since startup.
    pub fn notifications_dropped(&self) -> u64 {
        self.publisher.dropped_count()
    }

    // ── Read operations ──────────────────────────────────────

    pub async fn get_portfolio_list(&self, client: &str) -> Result<Vec<String>, SecwError> {
        let inner = self.inner.read().await;
        inner.config.authorize_any(client)?;
        Ok(inner.portfolios.iter().map(|p| p.name.clone()).collect())
    }

    pub async fn get_producer_usages(&self, client: &str) -> Result<Vec<UsageId>, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(
            client,
            ClientRole::Producer,
            command::GET_PRODUCER_USAGES,
        )?;
        Ok(granted.into_iter().collect())
    }

    pub async fn get_consumer_usages(&self, client: &str) -> Result<Vec<UsageId>, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(
            client,
            ClientRole::Consumer,
            command::GET_CONSUMER_USAGES,
        )?;
        Ok(granted.into_iter().collect())
    }

    /// Consumer list: full documents, secrets included. Optionally narrowed
    /// to one usage, one tag and/or one document type.
    pub async fn get_documents_with_secret(
        &self,
        client: &str,
        portfolio: &str,
        usage: Option<&str>,
        tag: Option<&str>,
        doc_type: Option<&str>,
    ) -> Result<Vec<Document>, SecwError> {
        self.list_documents(
            client,
            portfolio,
            usage,
            tag,
            doc_type,
            ClientRole::Consumer,
            command::GET_LIST_WITH_SECRET,
            false,
        )
        .await
    }

    /// Producer list: redacted copies only.
    pub async fn get_documents_without_secret(
        &self,
        client: &str,
        portfolio: &str,
        usage: Option<&str>,
        tag: Option<&str>,
        doc_type: Option<&str>,
    ) -> Result<Vec<Document>, SecwError> {
        self.list_documents(
            client,
            portfolio,
            usage,
            tag,
            doc_type,
            ClientRole::Producer,
            command::GET_LIST_WITHOUT_SECRET,
            true,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn list_documents(
        &self,
        client: &str,
        portfolio: &str,
        usage: Option<&str>,
        tag: Option<&str>,
        doc_type: Option<&str>,
        role: ClientRole,
        cmd: &str,
        redact: bool,
    ) -> Result<Vec<Document>, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(client, role, cmd)?;
        if let Some(u) = usage {
            if !inner.config.usage_exists(u) {
                return Err(SecwError::UnknownUsage { usage: u.into() });
            }
        }
        if let Some(t) = tag {
            if !inner.config.tag_exists(t) {
                return Err(SecwError::UnknownTag { tag: t.into() });
            }
        }
        let type_filter = doc_type.map(DocumentType::parse).transpose()?;
        let pf = portfolio_ref(&inner.portfolios, portfolio)?;
        Ok(pf
            .documents()
            .iter()
            .filter(|d| visible(d, &granted))
            .filter(|d| usage.map_or(true, |u| d.usages.contains(u)))
            .filter(|d| tag.map_or(true, |t| d.tags.iter().any(|dt| dt == t)))
            .filter(|d| type_filter.map_or(true, |t| d.doc_type() == t))
            .map(|d| if redact { d.redacted() } else { d.clone() })
            .collect())
    }

    pub async fn get_document_with_secret(
        &self,
        client: &str,
        portfolio: &str,
        id: &str,
    ) -> Result<Document, SecwError> {
        self.get_document(
            client,
            portfolio,
            id,
            ClientRole::Consumer,
            command::GET_WITH_SECRET,
            false,
        )
        .await
    }

    pub async fn get_document_without_secret(
        &self,
        client: &str,
        portfolio: &str,
        id: &str,
    ) -> Result<Document, SecwError> {
        self.get_document(
            client,
            portfolio,
            id,
            ClientRole::Producer,
            command::GET_WITHOUT_SECRET,
            true,
        )
        .await
    }

    async fn get_document(
        &self,
        client: &str,
        portfolio: &str,
        id: &str,
        role: ClientRole,
        cmd: &str,
        redact: bool,
    ) -> Result<Document, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(client, role, cmd)?;
        let pf = portfolio_ref(&inner.portfolios, portfolio)?;
        // A document outside the caller's grants answers exactly like a
        // missing one, so probing cannot reveal existence.
        let doc = pf
            .get_by_id(id)
            .filter(|d| visible(d, &granted))
            .ok_or_else(|| SecwError::DocumentDoNotExist { id: id.to_string() })?;
        Ok(if redact { doc.redacted() } else { doc.clone() })
    }

    pub async fn get_document_with_secret_by_name(
        &self,
        client: &str,
        portfolio: &str,
        name: &str,
    ) -> Result<Document, SecwError> {
        self.get_document_by_name(
            client,
            portfolio,
            name,
            ClientRole::Consumer,
            command::GET_WITH_SECRET_BY_NAME,
            false,
        )
        .await
    }

    pub async fn get_document_without_secret_by_name(
        &self,
        client: &str,
        portfolio: &str,
        name: &str,
    ) -> Result<Document, SecwError> {
        self.get_document_by_name(
            client,
            portfolio,
            name,
            ClientRole::Producer,
            command::GET_WITHOUT_SECRET_BY_NAME,
            true,
        )
        .await
    }

    async fn get_document_by_name(
        &self,
        client: &str,
        portfolio: &str,
        name: &str,
        role: ClientRole,
        cmd: &str,
        redact: bool,
    ) -> Result<Document, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(client, role, cmd)?;
        let pf = portfolio_ref(&inner.portfolios, portfolio)?;
        let doc = pf
            .get_by_name(name)
            .filter(|d| visible(d, &granted))
            .ok_or_else(|| SecwError::NameDoesNotExist {
                name: name.to_string(),
            })?;
        Ok(if redact { doc.redacted() } else { doc.clone() })
    }

    /// Batch producer read: ids that are missing or outside the caller's
    /// grants are silently dropped from the result.
    pub async fn get_documents_without_secret_by_ids(
        &self,
        client: &str,
        portfolio: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, SecwError> {
        let inner = self.inner.read().await;
        let granted = inner.config.authorize(
            client,
            ClientRole::Producer,
            command::GET_LIST_WITHOUT_SECRET_BY_IDS,
        )?;
        let pf = portfolio_ref(&inner.portfolios, portfolio)?;
        Ok(ids
            .iter()
            .filter_map(|id| pf.get_by_id(id))
            .filter(|d| visible(d, &granted))
            .map(Document::redacted)
            .collect())
    }

    pub async fn get_private_readable_tags(
        &self,
        client: &str,
    ) -> Result<Vec<TagDescription>, SecwError> {
        let inner = self.inner.read().await;
        inner.config.authorize(
            client,
            ClientRole::Consumer,
            command::GET_PRIVATE_READABLE_TAG_LIST,
        )?;
        Ok(inner.config.accessible_tags(client, AccessMethod::Read))
    }

    pub async fn get_editable_tags(&self, client: &str) -> Result<Vec<TagDescription>, SecwError> {
        let inner = self.inner.read().await;
        inner.config.authorize(
            client,
            ClientRole::Producer,
            command::GET_EDITABLE_TAG_LIST,
        )?;
        Ok(inner.config.accessible_tags(client, AccessMethod::Update))
    }

    // ── Write operations ─────────────────────────────────────
    //
    // All-or-nothing: validation and persistence both happen under the
    // write lock; a persistence failure restores the pre-mutation portfolio.
    // The notification is published after the lock is released, carrying a
    // sequence number assigned under it.

    pub async fn create(
        &self,
        client: &str,
        portfolio: &str,
        doc: Document,
    ) -> Result<Id, SecwError> {
        let (id, event) = {
            let mut inner = self.inner.write().await;
            let granted = inner
                .config
                .authorize(client, ClientRole::Producer, command::CREATE)?;
            check_write_usages(&inner.config, &granted, &doc)?;

            let index = portfolio_index(&inner.portfolios, portfolio)?;
            let backup = inner.portfolios[index].clone();
            let id = inner.portfolios[index].insert(doc, self.certs.as_ref())?;

            if let Err(e) = storage::save_database(&inner.database_path, &inner.portfolios) {
                inner.portfolios[index] = backup;
                return Err(e);
            }

            let sequence = inner.portfolios[index].next_sequence();
            let event = inner.portfolios[index]
                .get_by_id(&id)
                .map(|d| Notification::created(portfolio, d.redacted(), sequence));
            (id, event)
        };

        if let Some(event) = event {
            self.publisher.publish(event);
        }
        Ok(id)
    }

    pub async fn update(
        &self,
        client: &str,
        portfolio: &str,
        doc: Document,
    ) -> Result<(), SecwError> {
        let event = {
            let mut inner = self.inner.write().await;
            let granted = inner
                .config
                .authorize(client, ClientRole::Producer, command::UPDATE)?;
            check_write_usages(&inner.config, &granted, &doc)?;

            let index = portfolio_index(&inner.portfolios, portfolio)?;
            let backup = inner.portfolios[index].clone();
            let id = doc.id.clone();
            let outcome = inner.portfolios[index].update(doc, self.certs.as_ref())?;

            if let Err(e) = storage::save_database(&inner.database_path, &inner.portfolios) {
                inner.portfolios[index] = backup;
                return Err(e);
            }

            let sequence = inner.portfolios[index].next_sequence();
            inner.portfolios[index].get_by_id(&id).map(|new| {
                Notification::updated(
                    portfolio,
                    outcome.old.redacted(),
                    new.redacted(),
                    outcome.non_secret_changed,
                    outcome.secret_changed,
                    sequence,
                )
            })
        };

        if let Some(event) = event {
            self.publisher.publish(event);
        }
        Ok(())
    }

    pub async fn delete(
        &self,
        client: &str,
        portfolio: &str,
        id: &str,
    ) -> Result<(), SecwError> {
        let event = {
            let mut inner = self.inner.write().await;
            let granted = inner
                .config
                .authorize(client, ClientRole::Producer, command::DELETE)?;

            let index = portfolio_index(&inner.portfolios, portfolio)?;

            // Same opacity rule as reads, then full-grant check on the
            // document actually being removed.
            let target = inner.portfolios[index]
                .get_by_id(id)
                .filter(|d| visible(d, &granted))
                .ok_or_else(|| SecwError::DocumentDoNotExist { id: id.to_string() })?;
            if let Some(usage) = target.usages.iter().find(|u| !granted.contains(*u)) {
                return Err(SecwError::IllegalAction {
                    reason: format!("usage '{usage}' is not granted to this client"),
                });
            }

            let backup = inner.portfolios[index].clone();
            let old = inner.portfolios[index].remove(id)?;

            if let Err(e) = storage::save_database(&inner.database_path, &inner.portfolios) {
                inner.portfolios[index] = backup;
                return Err(e);
            }

            let sequence = inner.portfolios[index].next_sequence();
            Some(Notification::deleted(portfolio, old.redacted(), sequence))
        };

        if let Some(event) = event {
            self.publisher.publish(event);
        }
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn visible(doc: &Document, granted: &BTreeSet<UsageId>) -> bool {
    doc.usages.iter().any(|u| granted.contains(u))
}

fn portfolio_ref<'a>(
    portfolios: &'a [Portfolio],
    name: &str,
) -> Result<&'a Portfolio, SecwError> {
    portfolios
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| SecwError::UnknownPortfolio {
            portfolio: name.to_string(),
        })
}

fn portfolio_index(portfolios: &[Portfolio], name: &str) -> Result<usize, SecwError> {
    portfolios
        .iter()
        .position(|p| p.name == name)
        .ok_or_else(|| SecwError::UnknownPortfolio {
            portfolio: name.to_string(),
        })
}

/// Every usage on a written document must be declared and granted.
fn check_write_usages(
    config: &SecurityConfig,
    granted: &BTreeSet<UsageId>,
    doc: &Document,
) -> Result<(), SecwError> {
    for usage in &doc.usages {
        if !config.usage_exists(usage) {
            return Err(SecwError::UnknownUsage {
                usage: usage.clone(),
            });
        }
        if !granted.contains(usage) {
            return Err(SecwError::IllegalAction {
                reason: format!("usage '{usage}' is not granted to this client"),
            });
        }
    }
    Ok(())
}
