//! Subject management and the metadata-resolution pipeline.
//!
//! A [`Subject`] is the thing being cited: a URL (typically a GitHub
//! repository) or a DOI, plus everything resolution learns about it. The
//! [`Resolver`] runs the ordered, fallback-driven pipeline that decides
//! which source supplies the bibliographic record:
//!
//! 1. a known DOI (explicit, or discovered earlier) via content negotiation
//! 2. a citation-ready bibtex block embedded in the repository's
//!    README/CITATION files
//! 3. a zenodo DOI badge discovered in the same files
//! 4. a synthetic software record from the repository attributes
//! 5. the minimal `misc` record
//!
//! First success wins; partial results are never combined across
//! strategies, and every source failure degrades to the next strategy
//! rather than to an error.
//!
//! # Examples
//!
//! ```no_run
//! use citer::subject::Resolver;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = Resolver::default();
//!
//! // From a repository URL
//! let subject = resolver.resolve("https://github.com/impactstory/depsy").await?;
//! println!("{}", subject.output()?.citation);
//!
//! // Or from a DOI
//! let subject = resolver.resolve("10.5281/zenodo.50141").await?;
//! # Ok(())
//! # }
//! ```

use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

use super::*;
use crate::clients::github::{extract_bibtex, find_zenodo_doi, RepoInfo, UserInfo};

/// Openness classification of a subject, or the diagnostic marker left by
/// a failed open-access lookup.
///
/// The precedence is deliberately two-level: `Gold` (index code `1`)
/// always overwrites, `Unverified` (code `2`) is only recorded when no
/// `Gold` match exists yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OaStatus {
  /// A verified open-access copy exists.
  Gold,
  /// A copy exists but its openness is unverified.
  Unverified,
  /// The lookup failed; the string carries the diagnostic marker.
  Error(String),
}

/// The thing being cited.
///
/// Constructed per query, mutated only during resolution, and meant to be
/// read-only afterwards. Nothing is persisted: one resolution per
/// request, no caching layer beyond the per-subject memoized repository
/// slots below.
#[derive(Debug, Clone)]
pub struct Subject {
  /// Subject URL, when the query supplied or implied one.
  pub url:       Option<String>,
  /// Subject DOI; explicit or discovered from a repository badge.
  pub doi:       Option<String>,
  /// Citation style name used by [`Subject::output`].
  pub style:     String,
  /// The canonical record; populated exactly once per resolution.
  pub record:    Option<Record>,
  /// Openness code or diagnostic marker from the open-access pass.
  pub oa_status: Option<OaStatus>,
  /// Memoized repository attributes; fetched at most once per subject.
  repo_raw:      Option<RepoInfo>,
  /// Memoized owner-account attributes; fetched at most once per subject.
  user_raw:      Option<UserInfo>,
  /// Memoized README/CITATION blob; fetched at most once per subject.
  repo_text:     Option<String>,
}

impl Default for Subject {
  fn default() -> Self {
    Self {
      url:       None,
      doi:       None,
      style:     render::DEFAULT_STYLE.to_string(),
      record:    None,
      oa_status: None,
      repo_raw:  None,
      user_raw:  None,
      repo_text: None,
    }
  }
}

impl FromStr for Subject {
  type Err = CiterError;

  /// Classifies an input string as a URL or a DOI.
  ///
  /// Accepts any http(s) URL, a doi.org/dx.doi.org URL (the DOI is taken
  /// from the path), or a bare DOI. Anything else is the pipeline's one
  /// hard error.
  fn from_str(input: &str) -> Result<Self, Self::Err> {
    lazy_static! {
      /// Bare DOI pattern.
      static ref DOI: Regex = Regex::new(r"^10\.\d{4,9}/[-._;()/:\w]+$").unwrap();
    }

    if let Ok(url) = Url::parse(input) {
      return match url.host_str() {
        Some("doi.org") | Some("dx.doi.org") => {
          let doi = url.path().trim_start_matches('/');
          if doi.is_empty() {
            return Err(CiterError::InvalidIdentifier);
          }
          Ok(Self { doi: Some(doi.to_string()), ..Self::default() })
        },
        Some(_) => Ok(Self { url: Some(input.to_string()), ..Self::default() }),
        None => Err(CiterError::InvalidIdentifier),
      };
    }

    if DOI.is_match(input) {
      return Ok(Self { doi: Some(input.to_string()), ..Self::default() });
    }

    Err(CiterError::InvalidIdentifier)
  }
}

impl Subject {
  /// Creates a subject from a URL or DOI string.
  pub fn new(input: &str) -> Result<Self, CiterError> { input.parse() }

  /// Sets the citation style used when rendering output.
  pub fn with_style(mut self, style: &str) -> Self {
    self.style = style.to_string();
    self
  }

  /// The DOI resolver URL for this subject, when a DOI is known.
  pub fn doi_url(&self) -> Option<String> { self.doi.as_ref().map(|doi| format!("https://doi.org/{doi}")) }

  /// The URL shown to callers: the subject URL, else the DOI URL.
  pub fn display_url(&self) -> Option<String> { self.url.clone().or_else(|| self.doi_url()) }

  /// Whether the subject URL points at a github.com repository.
  pub fn has_repo_url(&self) -> bool { self.url.as_deref().is_some_and(|url| url.contains("github.com")) }

  /// The best known title for cross-source matching.
  pub fn best_title(&self) -> Option<&str> { self.record.as_ref().and_then(|record| record.title.as_deref()) }

  /// Clears open-access state before an enrichment pass.
  pub(crate) fn reset_open_access(&mut self) {
    self.oa_status = None;
    if let Some(record) = self.record.as_mut() {
      record.license = None;
      record.fulltext_url = None;
      record.repo_urls.clear();
    }
  }

  /// The caller-visible product: display URL, DOI, rendered citation, and
  /// the canonical record.
  ///
  /// # Errors
  ///
  /// Returns an error when the subject has not been resolved yet, the
  /// style name is unknown, or rendering fails with no captured raw
  /// citation text to fall back on.
  pub fn output(&self) -> Result<Output, CiterError> {
    let record =
      self.record.as_ref().ok_or_else(|| CiterError::ApiError("subject has not been resolved".to_string()))?;
    Ok(Output {
      url:      self.display_url(),
      doi:      self.doi.clone(),
      citation: render::render(record, &self.style)?,
      metadata: record.clone(),
    })
  }

  /// Fetch-once accessor for the repository attributes.
  async fn repo_info(&mut self, github: &GithubClient) -> Option<&RepoInfo> {
    if !self.has_repo_url() {
      return None;
    }
    if self.repo_raw.is_none() {
      let url = self.url.clone()?;
      match github.repo_info(&url).await {
        Ok(info) => self.repo_raw = Some(info),
        Err(e) => debug!("Repository attribute fetch failed: {e}"),
      }
    }
    self.repo_raw.as_ref()
  }

  /// Fetch-once accessor for the owner-account attributes.
  async fn user_info(&mut self, github: &GithubClient) -> Option<&UserInfo> {
    if !self.has_repo_url() {
      return None;
    }
    if self.user_raw.is_none() {
      let login = self.repo_info(github).await?.owner.login.clone();
      match github.user_info(&login).await {
        Ok(info) => self.user_raw = Some(info),
        Err(e) => debug!("Account attribute fetch failed: {e}"),
      }
    }
    self.user_raw.as_ref()
  }

  /// Fetch-once accessor for the concatenated README/CITATION blob.
  ///
  /// An empty blob is cached like any other so the candidate files are
  /// fetched at most once per subject.
  async fn citation_text(&mut self, github: &GithubClient) -> Option<&str> {
    if !self.has_repo_url() {
      return None;
    }
    if self.repo_text.is_none() {
      let url = self.url.clone()?;
      self.repo_text = Some(github.citation_text(&url).await);
    }
    self.repo_text.as_deref()
  }
}

/// The caller-visible product of one resolution.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
  /// Display URL: the subject URL, else the DOI URL.
  pub url:      Option<String>,
  /// The subject DOI, when known.
  pub doi:      Option<String>,
  /// Rendered citation text.
  pub citation: String,
  /// The canonical record.
  pub metadata: Record,
}

/// Runs the resolution pipeline over subjects.
///
/// Owns the per-source clients; subjects are independent, so one resolver
/// can serve any number of them in any order.
pub struct Resolver {
  /// DOI content-negotiation client.
  doi:    DoiClient,
  /// Repository API and raw-file client.
  github: GithubClient,
}

impl Resolver {
  /// Creates a resolver with the given repository credentials.
  pub fn new(credentials: Credentials) -> Self {
    Self { doi: DoiClient::new(), github: GithubClient::new(credentials) }
  }

  /// Resolves an input string into a subject with populated metadata.
  ///
  /// # Errors
  ///
  /// The only error is an input that is neither a URL nor a DOI; every
  /// downstream failure degrades to a weaker metadata strategy.
  pub async fn resolve(&self, input: &str) -> Result<Subject, CiterError> {
    let mut subject: Subject = input.parse()?;
    self.populate(&mut subject).await;
    Ok(subject)
  }

  /// Populates the canonical record for an already-classified subject.
  ///
  /// First success wins; on full fallthrough the subject gets the minimal
  /// `misc` record, so `record` is always set afterwards.
  pub async fn populate(&self, subject: &mut Subject) {
    if let Some(doi) = subject.doi.clone() {
      match self.doi.fetch_record(&doi).await {
        Ok(record) => {
          subject.record = Some(record);
          return;
        },
        Err(e) => debug!("DOI resolution failed, falling through: {e}"),
      }
    }

    if subject.has_repo_url() {
      let block = subject.citation_text(&self.github).await.and_then(extract_bibtex).map(str::to_string);
      if let Some(block) = block {
        match Record::from_bibtex(&block) {
          Ok(record) => {
            subject.record = Some(record);
            return;
          },
          Err(e) => debug!("Embedded citation block failed to parse: {e}"),
        }
      }

      let badge_doi = subject.citation_text(&self.github).await.and_then(find_zenodo_doi);
      if let Some(doi) = badge_doi {
        debug!("Discovered DOI {doi} from repository badge");
        subject.doi = Some(doi.clone());
        match self.doi.fetch_record(&doi).await {
          Ok(record) => {
            subject.record = Some(record);
            return;
          },
          Err(e) => debug!("Badge DOI resolution failed, falling through: {e}"),
        }
      }

      let software = self.software_record(subject).await;
      if let Some(record) = software {
        subject.record = Some(record);
        return;
      }
    }

    subject.record = Some(Record::misc(subject.url.clone()));
  }

  /// Synthesizes the minimal software record from repository attributes.
  async fn software_record(&self, subject: &mut Subject) -> Option<Record> {
    let url = subject.url.clone()?;
    let (title, year, login) = {
      let info = subject.repo_info(&self.github).await?;
      (info.name.clone(), info.year(), info.owner.login.clone())
    };
    let owner_name =
      subject.user_info(&self.github).await.and_then(|user| user.name.clone()).unwrap_or(login);

    Some(Record::software(title, Name::from_literal(&owner_name), url, Some(year)))
  }
}

impl Default for Resolver {
  /// A resolver with credentials from the `GITHUB_TOKENS` environment
  /// variable.
  fn default() -> Self { Self::new(Credentials::from_env()) }
}

#[cfg(test)]
mod tests {

  use super::*;

  #[test]
  fn test_subject_from_url() {
    let subject = Subject::new("http://cnn.com").unwrap();
    assert_eq!(subject.url.as_deref(), Some("http://cnn.com"));
    assert_eq!(subject.doi, None);
    assert!(!subject.has_repo_url());
  }

  #[test]
  fn test_subject_from_repo_url() {
    let subject = Subject::new("https://github.com/impactstory/depsy").unwrap();
    assert!(subject.has_repo_url());
    assert_eq!(subject.display_url().as_deref(), Some("https://github.com/impactstory/depsy"));
  }

  #[test]
  fn test_subject_from_doi() {
    let subject = Subject::new("10.5281/zenodo.50141").unwrap();
    assert_eq!(subject.doi.as_deref(), Some("10.5281/zenodo.50141"));
    assert_eq!(subject.doi_url().as_deref(), Some("https://doi.org/10.5281/zenodo.50141"));
    assert_eq!(subject.display_url(), subject.doi_url());
  }

  #[test]
  fn test_subject_from_doi_url() {
    let subject = Subject::new("https://doi.org/10.5281/zenodo.50141").unwrap();
    assert_eq!(subject.doi.as_deref(), Some("10.5281/zenodo.50141"));
    assert_eq!(subject.url, None);
  }

  #[test]
  fn test_subject_from_garbage() {
    assert!(Subject::new("not an identifier").is_err());
    assert!(Subject::new("").is_err());
    assert!(Subject::new("https://doi.org/").is_err());
  }

  #[test]
  fn test_default_style() {
    let subject = Subject::new("http://cnn.com").unwrap();
    assert_eq!(subject.style, render::DEFAULT_STYLE);
    assert_eq!(subject.with_style("apa").style, "apa");
  }
}
