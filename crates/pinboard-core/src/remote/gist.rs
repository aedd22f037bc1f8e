//! GitHub Gist backend.
//!
//! One gist holds one document; the envelope lives in a single named file
//! (`events.json` by default). Reads are anonymous, writes send the token
//! as a bearer credential.

use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, warn};
use url::Url;

use super::{Credential, DocumentStore, RawDocument};
use crate::config::RemoteConfig;
use crate::error::StoreError;

const ACCEPT: &str = "application/vnd.github+json";
const USER_AGENT: &str = concat!("pinboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct GistResponse {
    id: String,
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreatedGist {
    id: String,
}

/// [`DocumentStore`] backed by the Gist REST API.
pub struct GistStore {
    agent: ureq::Agent,
    config: RemoteConfig,
}

impl GistStore {
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        let mut builder = ureq::AgentBuilder::new().user_agent(USER_AGENT);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            config,
        }
    }

    fn gists_url(&self) -> Result<String, StoreError> {
        self.endpoint(None)
    }

    fn gist_url(&self, document_id: &str) -> Result<String, StoreError> {
        if !is_gist_id(document_id) {
            debug!(document_id, "refusing to address a malformed document id");
            return Err(StoreError::NotFound {
                document_id: document_id.to_string(),
            });
        }
        self.endpoint(Some(document_id))
    }

    fn endpoint(&self, document_id: Option<&str>) -> Result<String, StoreError> {
        let base = &self.config.api_base;
        let mut url = Url::parse(base)
            .map_err(|err| StoreError::request_failed(format!("invalid api_base {base}: {err}")))?;
        {
            let mut segments = url.path_segments_mut().map_err(|()| {
                StoreError::request_failed(format!("api_base {base} cannot carry a path"))
            })?;
            segments.pop_if_empty().push("gists");
            if let Some(id) = document_id {
                segments.push(id);
            }
        }
        Ok(url.into())
    }

    fn write_body(&self, content: &str, include_visibility: bool) -> serde_json::Value {
        let mut files = serde_json::Map::new();
        files.insert(self.config.file_name.clone(), json!({ "content": content }));

        let mut body = json!({
            "description": self.config.description,
            "files": files,
        });
        if include_visibility {
            body["public"] = json!(self.config.public);
        }
        body
    }

    fn send_write(
        &self,
        method: &str,
        url: &str,
        credential: &Credential,
        body: &serde_json::Value,
    ) -> Result<ureq::Response, StoreError> {
        self.agent
            .request(method, url)
            .set("Accept", ACCEPT)
            .set("Authorization", &format!("Bearer {}", credential.expose()))
            .send_json(body)
            .map_err(|err| classify(err, url))
    }

    fn fetch_raw(&self, raw_url: &str) -> Result<String, StoreError> {
        self.agent
            .get(raw_url)
            .call()
            .map_err(|err| classify(err, raw_url))?
            .into_string()
            .map_err(|err| StoreError::request_failed(format!("reading {raw_url}: {err}")))
    }
}

impl DocumentStore for GistStore {
    fn fetch(&self, document_id: &str) -> Result<RawDocument, StoreError> {
        let url = self.gist_url(document_id)?;
        let response = self
            .agent
            .get(&url)
            .set("Accept", ACCEPT)
            .call()
            .map_err(|err| match classify(err, &url) {
                StoreError::NotFound { .. } => StoreError::NotFound {
                    document_id: document_id.to_string(),
                },
                other => other,
            })?;

        let gist: GistResponse = response
            .into_json()
            .map_err(|err| StoreError::request_failed(format!("decoding gist response: {err}")))?;

        let Some(file) = gist.files.get(&self.config.file_name) else {
            debug!(document_id, file = %self.config.file_name, "gist has no payload file");
            return Err(StoreError::NotFound {
                document_id: document_id.to_string(),
            });
        };

        let content = match (&file.content, file.truncated, &file.raw_url) {
            (_, true, Some(raw_url)) => self.fetch_raw(raw_url)?,
            (Some(content), _, _) => content.clone(),
            (None, _, Some(raw_url)) => self.fetch_raw(raw_url)?,
            (None, _, None) => {
                return Err(StoreError::NotFound {
                    document_id: document_id.to_string(),
                });
            }
        };

        Ok(RawDocument {
            id: gist.id,
            content,
        })
    }

    fn create(&self, credential: &Credential, content: &str) -> Result<String, StoreError> {
        let url = self.gists_url()?;
        let body = self.write_body(content, true);
        let response = self.send_write("POST", &url, credential, &body)?;

        let created: CreatedGist = response
            .into_json()
            .map_err(|err| StoreError::request_failed(format!("decoding create response: {err}")))?;
        debug!(document_id = %created.id, "created gist");
        Ok(created.id)
    }

    fn replace(
        &self,
        credential: &Credential,
        document_id: &str,
        content: &str,
    ) -> Result<(), StoreError> {
        let url = self.gist_url(document_id)?;
        let body = self.write_body(content, false);
        self.send_write("PATCH", &url, credential, &body)
            .map_err(|err| match err {
                StoreError::NotFound { .. } => StoreError::NotFound {
                    document_id: document_id.to_string(),
                },
                other => other,
            })?;
        Ok(())
    }
}

fn classify(err: ureq::Error, url: &str) -> StoreError {
    match err {
        ureq::Error::Status(404, _) => StoreError::NotFound {
            document_id: url.to_string(),
        },
        ureq::Error::Status(code @ (401 | 403), response) => {
            let body = response.into_string().unwrap_or_default();
            warn!(status = code, "gist write rejected");
            StoreError::unauthorized(format!("HTTP {code}: {}", first_line(&body)))
        }
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            StoreError::request_failed(format!("HTTP {code}: {}", first_line(&body)))
        }
        ureq::Error::Transport(transport) => {
            StoreError::request_failed(format!("{url}: {transport}"))
        }
    }
}

/// Gist ids are opaque tokens; anything that could change the request path
/// is rejected before a request is built.
fn is_gist_id(document_id: &str) -> bool {
    !document_id.is_empty()
        && document_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn first_line(body: &str) -> &str {
    body.lines().next().unwrap_or("").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> GistStore {
        GistStore::new(RemoteConfig {
            api_base: "https://api.example.test/".into(),
            ..RemoteConfig::default()
        })
    }

    #[test]
    fn urls_trim_trailing_slash() {
        let store = store();
        assert_eq!(store.gists_url().expect("url"), "https://api.example.test/gists");
        assert_eq!(
            store.gist_url("abc").expect("url"),
            "https://api.example.test/gists/abc"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let store = GistStore::new(RemoteConfig {
            api_base: "https://ghe.example.test/api/v3".into(),
            ..RemoteConfig::default()
        });
        assert_eq!(
            store.gist_url("abc").expect("url"),
            "https://ghe.example.test/api/v3/gists/abc"
        );
    }

    #[test]
    fn path_changing_ids_never_reach_the_network() {
        let store = store();
        for id in ["../user", "..", "a/b", "abc?x=1", "abc#frag", "a%2Fb", ""] {
            assert!(
                matches!(store.gist_url(id), Err(StoreError::NotFound { .. })),
                "id {id:?}"
            );
        }

        let token = Credential::new("ghp_x").expect("token");
        assert!(matches!(
            store.replace(&token, "../user", "{}"),
            Err(StoreError::NotFound { ref document_id }) if document_id == "../user"
        ));
        assert!(matches!(
            store.fetch("../user"),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn create_body_carries_visibility_and_file() {
        let body = store().write_body("{}", true);
        assert_eq!(body["public"], json!(true));
        assert_eq!(body["description"], json!("Pinboard events"));
        assert_eq!(body["files"]["events.json"]["content"], json!("{}"));
    }

    #[test]
    fn replace_body_omits_visibility() {
        let body = store().write_body("{}", false);
        assert!(body.get("public").is_none());
        assert_eq!(body["files"]["events.json"]["content"], json!("{}"));
    }

    #[test]
    fn gist_response_tolerates_missing_fields() {
        let gist: GistResponse = serde_json::from_str(r#"{"id":"g1"}"#).expect("decode");
        assert_eq!(gist.id, "g1");
        assert!(gist.files.is_empty());

        let file: GistFile = serde_json::from_str(r#"{"truncated":true,"raw_url":"u"}"#)
            .expect("decode");
        assert!(file.truncated);
        assert!(file.content.is_none());
    }
}
