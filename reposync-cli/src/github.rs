//! GitHub REST [`RemotePort`]: contents API for files, git trees API for listings.
//!
//! Blocking `ureq` calls, one request per port call. No retries: transient
//! failures surface as per-path failures and the next run converges.

use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::json;

use reposync_core::RepoSlug;
use reposync_sync::{RemoteError, RemoteFile, RemotePort};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Environment variables consulted for a bearer token, in order.
const TOKEN_VARS: &[&str] = &["GH_TOKEN", "GITHUB_TOKEN"];

const USER_AGENT: &str = concat!("reposync/", env!("CARGO_PKG_VERSION"));

/// Longest error body excerpt kept in a failure message.
const MAX_BODY_EXCERPT: usize = 200;

pub struct GitHubRemote {
    agent: ureq::Agent,
    api_url: String,
    token: Option<String>,
}

impl GitHubRemote {
    pub fn new(api_url: &str, token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Token from `GH_TOKEN` or `GITHUB_TOKEN`; unauthenticated when neither is set.
    pub fn from_env(api_url: &str) -> Self {
        let token = TOKEN_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|t| !t.trim().is_empty());
        if token.is_none() {
            tracing::warn!("neither GH_TOKEN nor GITHUB_TOKEN is set; requests are unauthenticated");
        }
        Self::new(api_url, token)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        let req = self
            .agent
            .request(method, url)
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => req.set("Authorization", &format!("Bearer {token}")),
            None => req,
        }
    }

    fn contents_url(&self, repo: &RepoSlug, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_url,
            encode_segment(&repo.org.0),
            encode_segment(&repo.name.0),
            encode_path(path)
        )
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Tree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

// ---------------------------------------------------------------------------
// RemotePort
// ---------------------------------------------------------------------------

impl RemotePort for GitHubRemote {
    fn read(&self, repo: &RepoSlug, path: &str) -> Result<RemoteFile, RemoteError> {
        let url = self.contents_url(repo, path);
        tracing::debug!("GET {url}");
        let response = self.request("GET", &url).call().map_err(map_ureq_error)?;
        let body = response.into_string().map_err(|e| {
            RemoteError::transient(format!("reading response for {path}: {e}"))
        })?;
        // A directory answers with a JSON array, which fails to parse here.
        let file: ContentsFile = serde_json::from_str(&body)
            .map_err(|e| RemoteError::protocol(format!("{path} is not a file: {e}")))?;
        let content = decode_content(path, file.content.as_deref(), file.encoding.as_deref())?;
        Ok(RemoteFile {
            path: path.to_string(),
            revision: file.sha,
            content,
        })
    }

    fn write(
        &self,
        repo: &RepoSlug,
        path: &str,
        content: &[u8],
        revision: Option<&str>,
        message: &str,
    ) -> Result<String, RemoteError> {
        let url = self.contents_url(repo, path);
        let mut body = json!({
            "message": message,
            "content": general_purpose::STANDARD.encode(content),
        });
        if let Some(sha) = revision {
            body["sha"] = json!(sha);
        }
        tracing::debug!("PUT {url}");
        let response = self
            .request("PUT", &url)
            .send_json(body)
            .map_err(map_ureq_error)?;
        let written: WriteResponse = response
            .into_json()
            .map_err(|e| RemoteError::protocol(format!("write response for {path}: {e}")))?;
        Ok(written.content.sha)
    }

    fn delete(
        &self,
        repo: &RepoSlug,
        path: &str,
        revision: &str,
        message: &str,
    ) -> Result<(), RemoteError> {
        let url = self.contents_url(repo, path);
        tracing::debug!("DELETE {url}");
        self.request("DELETE", &url)
            .send_json(json!({ "message": message, "sha": revision }))
            .map_err(map_ureq_error)?;
        Ok(())
    }

    fn list_recursive(&self, repo: &RepoSlug, path: &str) -> Result<Vec<String>, RemoteError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/HEAD?recursive=1",
            self.api_url,
            encode_segment(&repo.org.0),
            encode_segment(&repo.name.0)
        );
        tracing::debug!("GET {url}");
        let response = match self.request("GET", &url).call() {
            Ok(response) => response,
            // An empty repository has no HEAD tree.
            Err(ureq::Error::Status(409, _)) => return Ok(Vec::new()),
            Err(err) => return Err(map_ureq_error(err)),
        };
        let tree: Tree = response
            .into_json()
            .map_err(|e| RemoteError::protocol(format!("tree listing for {repo}: {e}")))?;
        if tree.truncated {
            tracing::warn!("{repo}: tree listing truncated by the API; some paths are not listed");
        }
        Ok(blobs_under(tree.tree, path))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map_ureq_error(err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            classify_status(status, &body)
        }
        ureq::Error::Transport(transport) => RemoteError::transient(transport.to_string()),
    }
}

/// Map an HTTP error status to a [`RemoteError`].
///
/// 403 is treated as transient because GitHub uses it for secondary rate limits.
fn classify_status(status: u16, body: &str) -> RemoteError {
    let detail = format!("HTTP {status}: {}", error_message(body));
    match status {
        404 => RemoteError::NotFound,
        409 | 422 => RemoteError::conflict(detail),
        403 | 429 | 500..=599 => RemoteError::transient(detail),
        _ => RemoteError::protocol(detail),
    }
}

/// GitHub's `{"message": ...}` when present, otherwise a body excerpt.
fn error_message(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.message;
    }
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

fn decode_content(
    path: &str,
    content: Option<&str>,
    encoding: Option<&str>,
) -> Result<Vec<u8>, RemoteError> {
    match (content, encoding) {
        (Some(content), Some("base64")) => {
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| RemoteError::protocol(format!("{path}: invalid base64 content: {e}")))
        }
        (_, encoding) => Err(RemoteError::protocol(format!(
            "{path}: unsupported content encoding {}",
            encoding.unwrap_or("(none)")
        ))),
    }
}

fn blobs_under(entries: Vec<TreeEntry>, prefix: &str) -> Vec<String> {
    let prefix = prefix.trim_matches('/');
    let mut paths: Vec<String> = entries
        .into_iter()
        .filter(|e| e.kind == "blob")
        .map(|e| e.path)
        .filter(|p| {
            prefix.is_empty()
                || p == prefix
                || p.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
        })
        .collect();
    paths.sort();
    paths
}

fn encode_path(path: &str) -> String {
    path.split('/').map(encode_segment).collect::<Vec<_>>().join("/")
}

/// Percent-encode everything outside RFC 3986 unreserved characters.
fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
