//! Client implementation for batched open-access lookups against BASE.
//!
//! The Bielefeld Academic Search Engine (BASE) classifies documents with
//! an openness code: `1` means a verified open-access copy exists
//! (strongest), `2` means a copy exists but its openness is unverified.
//! One query covers a whole batch of subjects: every eligible title is
//! ORed into a single exact-phrase search, and returned documents are
//! fanned back onto subjects by normalized-title equality (many-to-many).
//!
//! This is an enrichment pass, not a resolution strategy: nothing here is
//! ever fatal. Transport failures leave every subject untouched; bad
//! responses leave a diagnostic marker on each subject instead of an
//! error.

use std::collections::HashMap;

use super::*;

/// Search endpoint of the open-access index.
const BASE_SEARCH_URL: &str = "https://api.base-search.net/cgi-bin/BaseHttpSearchInterface.fcgi";

/// Fields requested from the index for each document.
const BASE_FIELDS: &str = "dctitle,dccreator,dcyear,dcrights,dcprovider,dcidentifier,dcoa,dclink";

/// Timeout for the one batched query.
const BASE_TIMEOUT: Duration = Duration::from_secs(6);

/// Top-level index response shape.
#[derive(Debug, Deserialize)]
struct BaseResponse {
  /// Result container.
  response: BaseResults,
}

/// Result container of an index response.
#[derive(Debug, Deserialize)]
struct BaseResults {
  /// Matching documents.
  #[serde(default)]
  docs: Vec<BaseDoc>,
}

/// One document returned by the index.
#[derive(Debug, Deserialize)]
struct BaseDoc {
  /// Document title, matched back to subjects after normalization.
  dctitle:      Option<String>,
  /// Openness code: `1` verified open access, `2` unverified.
  dcoa:         Option<u8>,
  /// Provider-supplied link list.
  #[serde(default)]
  dcidentifier: Vec<String>,
  /// Free-text rights statement.
  dcrights:     Option<String>,
}

/// Client for the batched open-access index lookup.
///
/// Optionally routes through a static-IP proxy, which some index
/// deployments require for allow-listed access.
pub struct OpenAccessClient {
  /// Internal web client used to connect to the index.
  client: reqwest::Client,
}

impl OpenAccessClient {
  /// Creates a new index client, optionally routed through a proxy.
  ///
  /// # Errors
  ///
  /// Returns an error when the proxy URL is invalid or the underlying
  /// client cannot be constructed.
  pub fn new(proxy: Option<&str>) -> Result<Self, CiterError> {
    let mut builder = reqwest::Client::builder().user_agent("citer/0.1 (mailto:team@impactstory.org)");
    if let Some(proxy_url) = proxy {
      builder = builder.proxy(reqwest::Proxy::https(proxy_url)?);
    }
    Ok(Self { client: builder.build()? })
  }

  /// Attaches open-access links and licenses to a batch of subjects.
  ///
  /// Builds one combined query from every subject title with at least
  /// three words (first twelve words, reserved characters escaped), issues
  /// it with a fixed timeout, and applies matches by normalized title.
  /// Openness precedence is two-level: a code-1 document always
  /// overwrites, a code-2 document only applies when no code-1 match has
  /// been recorded for that subject. License fragments accumulate
  /// (semicolon-joined) and are normalized once after the batch.
  ///
  /// Never returns an error: failures degrade to untouched subjects or
  /// diagnostic markers.
  pub async fn enrich(&self, subjects: &mut [Subject]) {
    if subjects.is_empty() {
      debug!("Empty subject batch, skipping open-access lookup");
      return;
    }

    let mut titles_to_subjects: HashMap<String, Vec<usize>> = HashMap::new();
    let mut query_titles = Vec::new();
    for (index, subject) in subjects.iter_mut().enumerate() {
      subject.reset_open_access();
      let Some(title) = subject.best_title().map(str::to_string) else { continue };
      titles_to_subjects.entry(normalize::normalize_title(&title)).or_default().push(index);
      if let Some(query_title) = query_title(&title) {
        query_titles.push(query_title);
      }
    }

    if query_titles.is_empty() {
      debug!("No queryable titles in batch, skipping open-access lookup");
      return;
    }

    let url = format!(
      "{BASE_SEARCH_URL}?func=PerformSearch&query=(dcoa:1%20OR%20dcoa:2)%20AND%20dctitle:({})&fields={BASE_FIELDS}&hits=100000&format=json",
      query_titles.join("%20OR%20")
    );
    debug!("Querying open-access index with {} titles", query_titles.len());

    let response = match self.client.get(&url).timeout(BASE_TIMEOUT).send().await {
      Ok(response) => response,
      Err(e) => {
        warn!("Open-access lookup failed, leaving batch untouched: {e}");
        return;
      },
    };

    if !response.status().is_success() {
      warn!("Problem searching open-access index: status_code={}", response.status());
      let marker = format!("open-access query error: status_code={}", response.status().as_u16());
      for subject in subjects.iter_mut() {
        subject.oa_status = Some(OaStatus::Error(marker.clone()));
      }
      return;
    }

    let docs = match response.json::<BaseResponse>().await {
      Ok(parsed) => parsed.response.docs,
      Err(e) => {
        warn!("Decoding open-access index response failed: {e}");
        for subject in subjects.iter_mut() {
          subject.oa_status = Some(OaStatus::Error("open-access lookup error: json response parsing".to_string()));
        }
        return;
      },
    };

    let mut license_fragments = vec![String::new(); subjects.len()];
    for doc in &docs {
      let Some(title) = &doc.dctitle else { continue };
      let Some(indices) = titles_to_subjects.get(&normalize::normalize_title(title)) else { continue };
      for &index in indices {
        apply_doc(&mut subjects[index], doc, &mut license_fragments[index]);
      }
    }

    for (subject, fragments) in subjects.iter_mut().zip(&license_fragments) {
      if !fragments.is_empty() {
        if let Some(record) = subject.record.as_mut() {
          record.license = normalize::find_normalized_license(fragments);
        }
      }
    }
  }
}

/// Applies one index document to one matching subject.
///
/// Code `1` overwrites unconditionally; code `2` is additive and only
/// applies when no code-1 match has been recorded yet.
fn apply_doc(subject: &mut Subject, doc: &BaseDoc, license_fragments: &mut String) {
  let Some(record) = subject.record.as_mut() else { return };

  match doc.dcoa {
    Some(1) => {
      record.fulltext_url = pick_best_url(&doc.dcidentifier);
      record.repo_urls.clear();
      subject.oa_status = Some(OaStatus::Gold);
      if let Some(rights) = &doc.dcrights {
        license_fragments.push_str(rights);
        license_fragments.push(';');
      }
    },
    Some(2) if subject.oa_status != Some(OaStatus::Gold) => {
      record.repo_urls.extend(doc.dcidentifier.iter().cloned());
      subject.oa_status = Some(OaStatus::Unverified);
    },
    _ => {},
  }
}

/// Prepares one title for the combined query.
///
/// Titles with fewer than three words are excluded entirely; the rest are
/// truncated to their first twelve words, with reserved query characters
/// escaped (`"`, `#`, `=`, `&`, `%` become `?`; `-` becomes the wildcard
/// `*`) and the phrase pre-encoded for exact matching.
fn query_title(title: &str) -> Option<String> {
  let escaped = title.to_lowercase().replace(['"', '#', '=', '&', '%'], "?").replace('-', "*");

  let words: Vec<&str> = escaped.split_whitespace().collect();
  if words.len() < 3 {
    return None;
  }
  Some(format!("%22{}%22", words[..words.len().min(12)].join("%20")))
}

/// Scores one provider link; lower is better.
fn url_sort_score(url: &str) -> i32 {
  // a bare PMC stub the index sometimes returns; never use it
  if url == "http://www.ncbi.nlm.nih.gov/pmc/articles/PMC" {
    return 10;
  }
  // index DOIs are not always actually open; sort them down
  if url.contains("doi.org") {
    return 1;
  }
  // pmc results beat institutional-repository results when present
  if url.contains("/pmc/") {
    return -2;
  }
  -1
}

/// Picks the best-scored link from a provider link list.
fn pick_best_url(urls: &[String]) -> Option<String> {
  urls.iter().min_by_key(|url| url_sort_score(url)).cloned()
}

#[cfg(test)]
mod tests {
  use super::*;

  /// A resolved subject with the given title, ready for enrichment.
  fn subject_with_title(title: &str) -> Subject {
    let mut subject = Subject::default();
    let mut record = Record::misc(None);
    record.title = Some(title.to_string());
    subject.record = Some(record);
    subject
  }

  #[test]
  fn test_query_title_excludes_short_titles() {
    assert_eq!(query_title("Big Data"), None);
    assert_eq!(query_title(""), None);
    assert!(query_title("Instance selection of linear complexity").is_some());
  }

  #[test]
  fn test_query_title_escapes_and_truncates() {
    assert_eq!(query_title("Big-Data & Friends"), Some("%22big*data%20?%20friends%22".to_string()));

    let long = "one two three four five six seven eight nine ten eleven twelve thirteen fourteen";
    let query = query_title(long).unwrap();
    assert!(query.ends_with("twelve%22"));
    assert!(!query.contains("thirteen"));
  }

  #[test]
  fn test_pick_best_url() {
    let urls = vec![
      "https://doi.org/10.1/x".to_string(),
      "http://www.ncbi.nlm.nih.gov/pmc/articles/PMC".to_string(),
      "http://repository.example.edu/handle/1".to_string(),
      "http://www.ncbi.nlm.nih.gov/pmc/articles/PMC123/".to_string(),
    ];
    assert_eq!(pick_best_url(&urls).unwrap(), "http://www.ncbi.nlm.nih.gov/pmc/articles/PMC123/");
    assert_eq!(pick_best_url(&[]), None);
  }

  #[test]
  fn test_gold_is_never_downgraded() {
    let mut subject = subject_with_title("Instance selection of linear complexity");
    let mut fragments = String::new();

    let gold = BaseDoc {
      dctitle:      Some("Instance Selection of Linear Complexity".to_string()),
      dcoa:         Some(1),
      dcidentifier: vec!["http://repository.example.edu/handle/1".to_string()],
      dcrights:     Some("CC BY 4.0".to_string()),
    };
    let weaker = BaseDoc {
      dctitle:      gold.dctitle.clone(),
      dcoa:         Some(2),
      dcidentifier: vec!["http://other.example.edu/handle/2".to_string()],
      dcrights:     None,
    };

    apply_doc(&mut subject, &gold, &mut fragments);
    assert_eq!(subject.oa_status, Some(OaStatus::Gold));

    apply_doc(&mut subject, &weaker, &mut fragments);
    assert_eq!(subject.oa_status, Some(OaStatus::Gold));
    let record = subject.record.as_ref().unwrap();
    assert_eq!(record.fulltext_url.as_deref(), Some("http://repository.example.edu/handle/1"));
    assert!(record.repo_urls.is_empty());
    assert_eq!(fragments, "CC BY 4.0;");
  }

  #[test]
  fn test_weaker_code_is_additive_without_gold() {
    let mut subject = subject_with_title("Instance selection of linear complexity");
    let mut fragments = String::new();

    let weaker = BaseDoc {
      dctitle:      Some("Instance selection of linear complexity".to_string()),
      dcoa:         Some(2),
      dcidentifier: vec!["http://other.example.edu/handle/2".to_string()],
      dcrights:     None,
    };

    apply_doc(&mut subject, &weaker, &mut fragments);
    assert_eq!(subject.oa_status, Some(OaStatus::Unverified));
    assert_eq!(subject.record.as_ref().unwrap().repo_urls.len(), 1);
    assert!(subject.record.as_ref().unwrap().fulltext_url.is_none());
  }
}
