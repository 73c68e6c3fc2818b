//! The access-control configuration: declared usages, portfolio names,
//! per-client usage grants for the producer and consumer roles, and per-tag
//! CRUD rules.
//!
//! Client patterns are anchored regular expressions matched against the
//! whole client id, so a plain string behaves as an exact match.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use secw_types::{SecwError, TagDescription, UsageId};

// ── Roles and access methods ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    Producer,
    Consumer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMethod {
    Create,
    Read,
    Update,
    Delete,
}

impl AccessMethod {
    fn bit(self) -> u8 {
        match self {
            Self::Create => 0x1,
            Self::Read => 0x2,
            Self::Update => 0x4,
            Self::Delete => 0x8,
        }
    }
}

fn parse_methods(letters: &str) -> Result<u8, SecwError> {
    let mut mask = 0u8;
    for c in letters.chars() {
        mask |= match c {
            'C' => 0x1,
            'R' => 0x2,
            'U' => 0x4,
            'D' => 0x8,
            other => {
                return Err(SecwError::Unknown {
                    reason: format!("configuration: unknown access method '{other}'"),
                })
            }
        };
    }
    Ok(mask)
}

// ── Client patterns ──────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ClientPattern {
    raw: String,
    regex: Regex,
}

impl ClientPattern {
    fn compile(raw: &str) -> Result<ClientPattern, SecwError> {
        let regex = Regex::new(&format!("^(?:{raw})$")).map_err(|e| SecwError::Unknown {
            reason: format!("configuration: bad client pattern '{raw}': {e}"),
        })?;
        Ok(ClientPattern {
            raw: raw.to_string(),
            regex,
        })
    }

    fn matches(&self, client: &str) -> bool {
        self.regex.is_match(client)
    }
}

// ── On-disk shape ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ConfigFile {
    #[serde(default)]
    usages: Vec<UsageEntry>,
    #[serde(default)]
    portfolios: Vec<String>,
    #[serde(default)]
    producers: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    consumers: BTreeMap<String, BTreeSet<String>>,
    #[serde(default)]
    tags: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct UsageEntry {
    usage_id: String,
    name: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct TagEntry {
    tag_id: String,
    tag_name: String,
    #[serde(default)]
    tag_description: String,
    #[serde(default)]
    access: Vec<AccessEntry>,
}

#[derive(Deserialize)]
struct AccessEntry {
    client: String,
    methods: String,
}

// ── Runtime configuration ────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UsageDescription {
    pub id: UsageId,
    pub name: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone)]
struct TagAccess {
    description: TagDescription,
    rules: Vec<(ClientPattern, u8)>,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    usages: BTreeMap<UsageId, UsageDescription>,
    portfolios: Vec<String>,
    producers: Vec<(ClientPattern, BTreeSet<UsageId>)>,
    consumers: Vec<(ClientPattern, BTreeSet<UsageId>)>,
    tags: Vec<TagAccess>,
}

impl SecurityConfig {
    /// Load and compile the configuration file. Any failure here is fatal at
    /// startup; on hot-reload the caller keeps the previous configuration.
    pub fn load(path: &Path) -> Result<SecurityConfig, SecwError> {
        let contents = fs::read_to_string(path).map_err(|e| SecwError::Unknown {
            reason: format!("failed to read configuration {}: {e}", path.display()),
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<SecurityConfig, SecwError> {
        let file: ConfigFile = serde_json::from_str(contents).map_err(|e| SecwError::Unknown {
            reason: format!("failed to parse configuration: {e}"),
        })?;

        let mut usages = BTreeMap::new();
        for entry in file.usages {
            usages.insert(
                entry.usage_id.clone(),
                UsageDescription {
                    id: entry.usage_id,
                    name: entry.name,
                    display_name: entry.display_name,
                },
            );
        }

        let compile_grants = |grants: BTreeMap<String, BTreeSet<String>>| {
            grants
                .into_iter()
                .map(|(raw, set)| Ok((ClientPattern::compile(&raw)?, set)))
                .collect::<Result<Vec<_>, SecwError>>()
        };

        let producers = compile_grants(file.producers)?;
        let consumers = compile_grants(file.consumers)?;

        for (pattern, set) in producers.iter().chain(consumers.iter()) {
            for usage in set {
                if !usages.contains_key(usage) {
                    tracing::warn!(
                        pattern = %pattern.raw,
                        usage = %usage,
                        "configuration grants an undeclared usage; it will never match"
                    );
                }
            }
        }

        let mut tags = Vec::new();
        for entry in file.tags {
            let mut rules = Vec::new();
            for access in entry.access {
                rules.push((
                    ClientPattern::compile(&access.client)?,
                    parse_methods(&access.methods)?,
                ));
            }
            tags.push(TagAccess {
                description: TagDescription {
                    id: entry.tag_id,
                    name: entry.tag_name,
                    description: entry.tag_description,
                },
                rules,
            });
        }

        Ok(SecurityConfig {
            usages,
            portfolios: file.portfolios,
            producers,
            consumers,
            tags,
        })
    }

    pub fn portfolio_names(&self) -> &[String] {
        &self.portfolios
    }

    pub fn usage_exists(&self, usage: &str) -> bool {
        self.usages.contains_key(usage)
    }

    pub fn tag_exists(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.description.id == tag)
    }

    pub fn usage_descriptions(&self) -> impl Iterator<Item = &UsageDescription> {
        self.usages.values()
    }

    pub fn is_producer(&self, client: &str) -> bool {
        self.producers.iter().any(|(p, _)| p.matches(client))
    }

    pub fn is_consumer(&self, client: &str) -> bool {
        self.consumers.iter().any(|(p, _)| p.matches(client))
    }

    /// Union of the usage grants over every pattern matching `client`,
    /// restricted to declared usages.
    pub fn granted_usages(&self, client: &str, role: ClientRole) -> BTreeSet<UsageId> {
        let grants = match role {
            ClientRole::Producer => &self.producers,
            ClientRole::Consumer => &self.consumers,
        };
        grants
            .iter()
            .filter(|(pattern, _)| pattern.matches(client))
            .flat_map(|(_, set)| set.iter())
            .filter(|usage| self.usages.contains_key(*usage))
            .cloned()
            .collect()
    }

    /// Role gate for a command: the granted usage set on success,
    /// `UnsupportedCommand` for a known client in the wrong role,
    /// `UnknownClient` for a caller matching no pattern at all.
    pub fn authorize(
        &self,
        client: &str,
        role: ClientRole,
        command: &str,
    ) -> Result<BTreeSet<UsageId>, SecwError> {
        let holds = match role {
            ClientRole::Producer => self.is_producer(client),
            ClientRole::Consumer => self.is_consumer(client),
        };
        if holds {
            Ok(self.granted_usages(client, role))
        } else if self.is_producer(client) || self.is_consumer(client) {
            Err(SecwError::UnsupportedCommand {
                command: command.to_string(),
            })
        } else {
            Err(SecwError::UnknownClient {
                client: client.to_string(),
            })
        }
    }

    /// Gate for commands open to both roles.
    pub fn authorize_any(&self, client: &str) -> Result<(), SecwError> {
        if self.is_producer(client) || self.is_consumer(client) {
            Ok(())
        } else {
            Err(SecwError::UnknownClient {
                client: client.to_string(),
            })
        }
    }

    /// Per-tag CRUD check. A tag with no matching rule, or an unknown tag,
    /// is denied.
    pub fn tag_access(&self, client: &str, tag_id: &str, method: AccessMethod) -> bool {
        self.tags
            .iter()
            .filter(|t| t.description.id == tag_id)
            .flat_map(|t| t.rules.iter())
            .any(|(pattern, mask)| pattern.matches(client) && mask & method.bit() != 0)
    }

    /// Descriptions of every tag the client may access with `method`.
    pub fn accessible_tags(&self, client: &str, method: AccessMethod) -> Vec<TagDescription> {
        self.tags
            .iter()
            .filter(|t| {
                t.rules
                    .iter()
                    .any(|(pattern, mask)| pattern.matches(client) && mask & method.bit() != 0)
            })
            .map(|t| t.description.clone())
            .collect()
    }
}
