//! Client implementation for repository metadata and embedded citations.
//!
//! A GitHub repository contributes two kinds of citation evidence: the
//! attributes of the repository itself (owner, name, creation year), used
//! to synthesize a minimal software record, and the text of its top-level
//! README/CITATION files, which may embed a citation-ready bibtex block or
//! a zenodo DOI badge.
//!
//! Raw files are fetched from branch `master` only; there is no
//! default-branch discovery. The bibtex scan and the badge scan each use
//! the first match only — a best-effort heuristic, kept deliberately.
//!
//! # Examples
//!
//! ```no_run
//! use citer::clients::{Credentials, GithubClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GithubClient::new(Credentials::from_env());
//! let repo = client.repo_info("https://github.com/impactstory/depsy").await?;
//!
//! println!("{} created in {}", repo.name, repo.year());
//! # Ok(())
//! # }
//! ```

use lazy_static::lazy_static;
use regex::Regex;

use super::*;

/// Candidate file names scanned for embedded citation declarations, in
/// fetch order. Every file found contributes to one concatenated blob.
const CITATION_FILES: [&str; 4] = ["README", "README.md", "CITATION", "CITATION.md"];

/// Timeout for each raw-file fetch.
const RAW_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// An ordered list of login/token pairs for the repository API.
///
/// The list shape mirrors how deployments configure rotating credentials,
/// but only the first pair is ever consulted. With no pairs configured,
/// requests are sent unauthenticated.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
  /// Ordered login/token pairs; only the first is consulted.
  pairs: Vec<(String, String)>,
}

impl Credentials {
  /// Builds credentials from an explicit list of login/token pairs.
  pub fn new(pairs: Vec<(String, String)>) -> Self { Self { pairs } }

  /// Parses the `login:token,login:token,...` form used by the
  /// `GITHUB_TOKENS` environment variable. Malformed entries are skipped.
  pub fn parse(raw: &str) -> Self {
    let pairs = raw
      .split(',')
      .filter_map(|pair| {
        let (login, token) = pair.split_once(':')?;
        (!login.trim().is_empty() && !token.trim().is_empty())
          .then(|| (login.trim().to_string(), token.trim().to_string()))
      })
      .collect();
    Self { pairs }
  }

  /// Reads credentials from the `GITHUB_TOKENS` environment variable.
  pub fn from_env() -> Self { Self::parse(&std::env::var("GITHUB_TOKENS").unwrap_or_default()) }

  /// The pair actually used for requests.
  fn primary(&self) -> Option<&(String, String)> { self.pairs.first() }
}

/// Repository attributes from the hosting API.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
  /// Repository name.
  pub name:       String,
  /// Owning account.
  pub owner:      RepoOwner,
  /// Repository creation timestamp; only the year is consumed downstream.
  pub created_at: DateTime<Utc>,
}

impl RepoInfo {
  /// The repository's creation year.
  pub fn year(&self) -> i32 { self.created_at.year() }
}

/// The owning account of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoOwner {
  /// Account login.
  pub login: String,
}

/// Account attributes from the hosting API.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
  /// Display name, when the account has one.
  pub name: Option<String>,
}

/// Client for the repository hosting API and raw file fetches.
pub struct GithubClient {
  /// Internal web client used to connect to the API.
  client:      reqwest::Client,
  /// Injected credential list; read once at construction, never refreshed.
  credentials: Credentials,
}

impl GithubClient {
  /// Creates a new client with the given credential list.
  pub fn new(credentials: Credentials) -> Self {
    Self {
      client: reqwest::Client::builder().user_agent("citer/0.1 (mailto:team@impactstory.org)").build().unwrap(),
      credentials,
    }
  }

  /// Starts a request with Basic auth applied when a pair is configured.
  fn get(&self, url: &str) -> reqwest::RequestBuilder {
    let mut request = self.client.get(url);
    if let Some((login, token)) = self.credentials.primary() {
      request = request.basic_auth(login, Some(token));
    }
    request
  }

  /// Fetches repository attributes for a repository URL.
  ///
  /// # Errors
  ///
  /// Returns an error when the URL is not a repository URL, the request
  /// fails, or the API answers with a non-success status.
  pub async fn repo_info(&self, repo_url: &str) -> Result<RepoInfo, CiterError> {
    let api_url = api_url(repo_url).ok_or(CiterError::InvalidIdentifier)?;
    debug!("Fetching repository attributes via: {api_url}");

    let response = self.get(&api_url).send().await?;
    if !response.status().is_success() {
      return Err(CiterError::NotFound);
    }
    Ok(response.json().await?)
  }

  /// Fetches account attributes for an owner login.
  ///
  /// # Errors
  ///
  /// Returns an error when the request fails or the API answers with a
  /// non-success status.
  pub async fn user_info(&self, login: &str) -> Result<UserInfo, CiterError> {
    let api_url = format!("https://api.github.com/users/{login}");
    debug!("Fetching account attributes via: {api_url}");

    let response = self.get(&api_url).send().await?;
    if !response.status().is_success() {
      return Err(CiterError::NotFound);
    }
    Ok(response.json().await?)
  }

  /// Fetches and concatenates every candidate citation file that exists.
  ///
  /// Files are fetched from branch `master` of the repository; each one
  /// found is appended to one text blob. Missing or unreadable files
  /// contribute nothing, so a repository with no candidate files yields
  /// an empty blob.
  pub async fn citation_text(&self, repo_url: &str) -> String {
    let base = repo_url.trim_end_matches('/');
    let mut concatenated = String::new();

    for filename in CITATION_FILES {
      let url = format!("{base}/raw/master/{filename}");
      debug!("Fetching candidate citation file: {url}");

      match self.client.get(&url).timeout(RAW_FETCH_TIMEOUT).send().await {
        Ok(response) if response.status().is_success() => match response.text().await {
          Ok(text) => {
            concatenated.push('\n');
            concatenated.push_str(&text);
          },
          Err(e) => debug!("Discarding unreadable candidate file: {e}"),
        },
        Ok(response) => debug!("No candidate file at {url}: {}", response.status()),
        Err(e) => debug!("Candidate file fetch failed: {e}"),
      }
    }

    concatenated
  }
}

/// Rewrites a repository URL into its API endpoint.
///
/// Returns `None` for URLs that are not github.com repository URLs.
fn api_url(repo_url: &str) -> Option<String> {
  repo_url.contains("github.com/").then(|| repo_url.replace("github.com/", "api.github.com/repos/"))
}

/// Extracts the first citation-ready bibtex block from repository text.
///
/// The pattern is a lenient greedy scan for the outermost `@...{...}`
/// span: it starts at the first `@` and runs to the last `}` in the text.
/// Only the first match is used.
pub fn extract_bibtex(text: &str) -> Option<&str> {
  lazy_static! {
    /// Greedy dot-all scan for a bibtex-shaped span.
    static ref BIBTEX: Regex = Regex::new(r"(?s)@.+\{.+\}").unwrap();
  }
  BIBTEX.find(text).map(|m| m.as_str())
}

/// Extracts the record identifier from an embedded zenodo DOI badge.
///
/// The scan is case-folded and stops at the first match; the identifier
/// is treated as a DOI by the caller.
pub fn find_zenodo_doi(text: &str) -> Option<String> {
  lazy_static! {
    /// Badge image URL of the form `://zenodo.org/badge/doi/<doi>.svg`.
    static ref ZENODO_BADGE: Regex = Regex::new(r"://zenodo\.org/badge/doi/(.+?)\.svg").unwrap();
  }
  if !text.contains("zenodo") && !text.contains("Zenodo") {
    return None;
  }
  let lowered = text.to_lowercase();
  ZENODO_BADGE.captures(&lowered).and_then(|cap| cap.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_api_url_rewrite() {
    assert_eq!(
      api_url("https://github.com/impactstory/depsy").as_deref(),
      Some("https://api.github.com/repos/impactstory/depsy")
    );
    assert_eq!(api_url("http://cnn.com"), None);
  }

  #[test]
  fn test_credentials_parse() {
    let credentials = Credentials::parse("alice:token1,bob:token2");
    assert_eq!(credentials.primary(), Some(&("alice".to_string(), "token1".to_string())));

    assert_eq!(Credentials::parse("").primary(), None);
    assert_eq!(Credentials::parse("garbage").primary(), None);
    // malformed leading entry is skipped, not fatal
    assert_eq!(Credentials::parse("nocolon,carol:token3").primary().map(|p| p.0.as_str()), Some("carol"));
  }

  #[test]
  fn test_extract_bibtex_is_greedy_first_match() {
    let readme = "Cite this as:\n@misc{depsy, title={Depsy}}\ntrailing text\n@article{other, title={Other}}";
    // greedy: first @ through the last closing brace
    let block = extract_bibtex(readme).unwrap();
    assert!(block.starts_with("@misc{depsy"));
    assert!(block.ends_with("title={Other}}"));

    assert_eq!(extract_bibtex("no citation here"), None);
  }

  #[test]
  fn test_find_zenodo_doi() {
    let readme = "# pvlib\n[![DOI](https://zenodo.org/badge/DOI/10.5281/zenodo.50141.svg)]\
                  (https://zenodo.org/badge/latestdoi/12345)";
    assert_eq!(find_zenodo_doi(readme).as_deref(), Some("10.5281/zenodo.50141"));

    assert_eq!(find_zenodo_doi("no badge in sight"), None);
    assert_eq!(find_zenodo_doi("zenodo is mentioned without a badge"), None);
  }

  #[ignore = "requires network access"]
  #[tokio::test]
  async fn test_repo_info_live() -> anyhow::Result<()> {
    let client = GithubClient::new(Credentials::from_env());
    let repo = client.repo_info("https://github.com/impactstory/depsy").await?;

    assert_eq!(repo.name, "depsy");
    assert_eq!(repo.owner.login, "impactstory");
    assert_eq!(repo.year(), 2015);
    Ok(())
  }
}
