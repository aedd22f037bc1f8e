//! Role selection from connection parameters.
//!
//! | credential | document id | role                                   |
//! |------------|-------------|----------------------------------------|
//! | present    | present     | owner                                  |
//! | absent     | present     | viewer                                 |
//! | present    | absent      | owner, creates the document on demand  |
//! | absent     | absent      | local-only submitter                   |

use serde::Serialize;
use std::fmt;
use tracing::warn;
use url::Url;

use crate::remote::Credential;

/// Query parameter carrying the document id in join links.
pub const DOCUMENT_PARAM: &str = "gist";
/// Query parameter carrying the credential in join links.
pub const CREDENTIAL_PARAM: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Reads, polls, appends, and creates the document if absent.
    Owner,
    /// Reads for display only.
    Viewer,
    /// Writes go to the local fallback store only.
    LocalOnly,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Viewer => "viewer",
            Self::LocalOnly => "local-only",
        }
    }

    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure role table.
#[must_use]
pub const fn select_role(has_credential: bool, has_document: bool) -> Role {
    match (has_credential, has_document) {
        (true, _) => Role::Owner,
        (false, true) => Role::Viewer,
        (false, false) => Role::LocalOnly,
    }
}

/// Raw `token` and `gist` values carried by a join link, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinLink {
    pub token: Option<String>,
    pub document_id: Option<String>,
}

impl JoinLink {
    /// # Errors
    ///
    /// Returns the URL parse error for malformed links.
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(raw)?;
        let mut link = Self::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                CREDENTIAL_PARAM => link.token = Some(value.into_owned()),
                DOCUMENT_PARAM => link.document_id = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(link)
    }
}

/// Credential and document id as handed to a session at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub credential: Option<Credential>,
    pub document_id: Option<String>,
}

impl ConnectionParams {
    /// Build from optional raw values; blanks count as absent.
    #[must_use]
    pub fn new(token: Option<&str>, document_id: Option<&str>) -> Self {
        let credential = token.and_then(Credential::new);
        if let Some(cred) = &credential {
            if !cred.has_known_prefix() {
                warn!("token format looks unusual; check that it is valid");
            }
        }

        Self {
            credential,
            document_id: document_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        }
    }

    /// Parse the `token` and `gist` parameters out of a join link.
    ///
    /// # Errors
    ///
    /// Returns the URL parse error for malformed links.
    pub fn from_url(raw: &str) -> Result<Self, url::ParseError> {
        let link = JoinLink::parse(raw)?;
        Ok(Self::new(link.token.as_deref(), link.document_id.as_deref()))
    }

    /// Role these parameters select at session start.
    #[must_use]
    pub const fn role(&self) -> Role {
        select_role(self.credential.is_some(), self.document_id.is_some())
    }
}

/// Build the participant link carrying the document id and credential.
///
/// Existing query parameters on `base` are kept; `gist` and `token` are
/// replaced.
///
/// # Errors
///
/// Returns the URL parse error for a malformed base.
pub fn join_url(
    base: &str,
    document_id: Option<&str>,
    credential: Option<&Credential>,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != DOCUMENT_PARAM && k != CREDENTIAL_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (k, v) in &kept {
            query.append_pair(k, v);
        }
        if let Some(id) = document_id {
            query.append_pair(DOCUMENT_PARAM, id);
        }
        if let Some(cred) = credential {
            query.append_pair(CREDENTIAL_PARAM, cred.expose());
        }
    }
    if url.query() == Some("") {
        url.set_query(None);
    }
    Ok(url.into())
}
