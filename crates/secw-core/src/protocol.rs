//! Request/response framing and the command dispatcher.
//!
//! A request is the transport-peeled triple (sender identity, command name,
//! argument frames). Replies are frame lists: `OK` followed by result
//! frames, or `ERROR` followed by the JSON error envelope.

use serde::Serialize;
use serde_json::Value;

use secw_types::{ClientId, Document, SecwError};

use crate::Wallet;

/// Wire command names.
pub mod command {
    pub const GET_PORTFOLIO_LIST: &str = "GET_PORTFOLIO_LIST";
    pub const GET_CONSUMER_USAGES: &str = "GET_CONSUMER_USAGES";
    pub const GET_PRODUCER_USAGES: &str = "GET_PRODUCER_USAGES";
    pub const GET_LIST_WITH_SECRET: &str = "GET_LIST_WITH_SECRET";
    pub const GET_LIST_WITHOUT_SECRET: &str = "GET_LIST_WITHOUT_SECRET";
    pub const GET_WITH_SECRET: &str = "GET_WITH_SECRET";
    pub const GET_WITHOUT_SECRET: &str = "GET_WITHOUT_SECRET";
    pub const GET_WITH_SECRET_BY_NAME: &str = "GET_WITH_SECRET_BY_NAME";
    pub const GET_WITHOUT_SECRET_BY_NAME: &str = "GET_WITHOUT_SECRET_BY_NAME";
    pub const GET_LIST_WITHOUT_SECRET_BY_IDS: &str = "GET_LIST_WITHOUT_SECRET_BY_IDS";
    pub const CREATE: &str = "CREATE";
    pub const UPDATE: &str = "UPDATE";
    pub const DELETE: &str = "DELETE";
    pub const GET_PRIVATE_READABLE_TAG_LIST: &str = "GET_PRIVATE_READABLE_TAG_LIST";
    pub const GET_EDITABLE_TAG_LIST: &str = "GET_EDITABLE_TAG_LIST";
}

pub const FRAME_OK: &str = "OK";
pub const FRAME_ERROR: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Client identity, supplied by the transport.
    pub sender: ClientId,
    pub command: String,
    pub frames: Vec<String>,
}

impl Request {
    pub fn new(
        sender: impl Into<String>,
        command: impl Into<String>,
        frames: Vec<String>,
    ) -> Request {
        Request {
            sender: sender.into(),
            command: command.into(),
            frames,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Ok(Vec<String>),
    Error(SecwError),
}

impl Response {
    /// The reply frames as they go on the wire.
    pub fn into_frames(self) -> Vec<String> {
        match self {
            Response::Ok(frames) => {
                let mut all = Vec::with_capacity(frames.len() + 1);
                all.push(FRAME_OK.to_string());
                all.extend(frames);
                all
            }
            Response::Error(e) => vec![FRAME_ERROR.to_string(), e.to_envelope().to_string()],
        }
    }

    /// Decode reply frames back into result frames or a typed error. Used by
    /// client-side accessors and tests.
    pub fn from_frames(frames: &[String]) -> Result<Vec<String>, SecwError> {
        match frames.first().map(String::as_str) {
            Some(FRAME_OK) => Ok(frames[1..].to_vec()),
            Some(FRAME_ERROR) => {
                let envelope: Value = frames
                    .get(1)
                    .and_then(|f| serde_json::from_str(f).ok())
                    .unwrap_or(Value::Null);
                Err(SecwError::from_envelope(&envelope))
            }
            _ => Err(SecwError::ProtocolError {
                reason: "reply is missing its status frame".into(),
            }),
        }
    }
}

impl Wallet {
    /// Dispatch one request. Never panics and never returns transport-level
    /// failures; everything surfaces as an `ERROR` reply.
    pub async fn handle_request(&self, request: &Request) -> Response {
        match self.dispatch(request).await {
            Ok(frames) => Response::Ok(frames),
            Err(e) => Response::Error(e),
        }
    }

    async fn dispatch(&self, request: &Request) -> Result<Vec<String>, SecwError> {
        let client = request.sender.as_str();
        match request.command.as_str() {
            command::GET_PORTFOLIO_LIST => json_frame(&self.get_portfolio_list(client).await?),
            command::GET_CONSUMER_USAGES => json_frame(&self.get_consumer_usages(client).await?),
            command::GET_PRODUCER_USAGES => json_frame(&self.get_producer_usages(client).await?),
            command::GET_LIST_WITH_SECRET => {
                let portfolio = frame(request, 0)?;
                let usage = optional_frame(request, 1);
                let tag = optional_frame(request, 2);
                let doc_type = optional_frame(request, 3);
                json_frame(
                    &self
                        .get_documents_with_secret(client, portfolio, usage, tag, doc_type)
                        .await?,
                )
            }
            command::GET_LIST_WITHOUT_SECRET => {
                let portfolio = frame(request, 0)?;
                let usage = optional_frame(request, 1);
                let tag = optional_frame(request, 2);
                let doc_type = optional_frame(request, 3);
                json_frame(
                    &self
                        .get_documents_without_secret(client, portfolio, usage, tag, doc_type)
                        .await?,
                )
            }
            command::GET_WITH_SECRET => {
                let portfolio = frame(request, 0)?;
                let id = frame(request, 1)?;
                json_frame(&self.get_document_with_secret(client, portfolio, id).await?)
            }
            command::GET_WITHOUT_SECRET => {
                let portfolio = frame(request, 0)?;
                let id = frame(request, 1)?;
                json_frame(
                    &self
                        .get_document_without_secret(client, portfolio, id)
                        .await?,
                )
            }
            command::GET_WITH_SECRET_BY_NAME => {
                let portfolio = frame(request, 0)?;
                let name = frame(request, 1)?;
                json_frame(
                    &self
                        .get_document_with_secret_by_name(client, portfolio, name)
                        .await?,
                )
            }
            command::GET_WITHOUT_SECRET_BY_NAME => {
                let portfolio = frame(request, 0)?;
                let name = frame(request, 1)?;
                json_frame(
                    &self
                        .get_document_without_secret_by_name(client, portfolio, name)
                        .await?,
                )
            }
            command::GET_LIST_WITHOUT_SECRET_BY_IDS => {
                let portfolio = frame(request, 0)?;
                let ids = parse_ids_frame(frame(request, 1)?)?;
                json_frame(
                    &self
                        .get_documents_without_secret_by_ids(client, portfolio, &ids)
                        .await?,
                )
            }
            command::CREATE => {
                let portfolio = frame(request, 0)?;
                let doc = parse_document_frame(frame(request, 1)?)?;
                let id = self.create(client, portfolio, doc).await?;
                Ok(vec![id])
            }
            command::UPDATE => {
                let portfolio = frame(request, 0)?;
                let doc = parse_document_frame(frame(request, 1)?)?;
                self.update(client, portfolio, doc).await?;
                Ok(Vec::new())
            }
            command::DELETE => {
                let portfolio = frame(request, 0)?;
                let id = frame(request, 1)?;
                self.delete(client, portfolio, id).await?;
                Ok(Vec::new())
            }
            command::GET_PRIVATE_READABLE_TAG_LIST => {
                json_frame(&self.get_private_readable_tags(client).await?)
            }
            command::GET_EDITABLE_TAG_LIST => json_frame(&self.get_editable_tags(client).await?),
            other => Err(SecwError::UnsupportedCommand {
                command: other.to_string(),
            }),
        }
    }
}

fn frame<'a>(request: &'a Request, index: usize) -> Result<&'a str, SecwError> {
    request
        .frames
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| SecwError::ProtocolError {
            reason: format!(
                "command {} is missing argument frame {index}",
                request.command
            ),
        })
}

fn optional_frame(request: &Request, index: usize) -> Option<&str> {
    request
        .frames
        .get(index)
        .map(String::as_str)
        .filter(|f| !f.is_empty())
}

fn json_frame<T: Serialize>(value: &T) -> Result<Vec<String>, SecwError> {
    serde_json::to_string(value)
        .map(|s| vec![s])
        .map_err(|e| SecwError::Unknown {
            reason: format!("failed to serialize reply: {e}"),
        })
}

fn parse_document_frame(text: &str) -> Result<Document, SecwError> {
    let value: Value = serde_json::from_str(text).map_err(|e| SecwError::ProtocolError {
        reason: format!("invalid document JSON: {e}"),
    })?;
    Document::from_value(&value)
}

fn parse_ids_frame(text: &str) -> Result<Vec<String>, SecwError> {
    serde_json::from_str(text).map_err(|e| SecwError::ProtocolError {
        reason: format!("invalid id list JSON: {e}"),
    })
}
