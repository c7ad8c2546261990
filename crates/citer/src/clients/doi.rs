//! Client implementation for resolving DOIs via content negotiation.
//!
//! A DOI resolves to structured citation metadata by asking doi.org for a
//! CSL-JSON representation (with RDF/XML as a lower-weighted fallback the
//! registration agencies all understand). The payload is authoritative, so
//! conversion into the canonical [`Record`] is a pass-through of the known
//! key set with author names normalized.
//!
//! There is no retry here: a transport failure or non-success status is
//! reported to the caller, which treats it as "no contribution" and falls
//! through to its next strategy.
//!
//! # Examples
//!
//! ```no_run
//! use citer::clients::DoiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DoiClient::new();
//! let record = client.fetch_record("10.5281/zenodo.50141").await?;
//!
//! println!("Title: {:?}", record.title);
//! # Ok(())
//! # }
//! ```

use super::*;

/// Accept header requesting CSL-JSON first, RDF/XML as a fallback weight.
const ACCEPT_CSL_JSON: &str = "application/vnd.citationstyles.csl+json;q=1.0, application/rdf+xml;q=0.5";

/// A CSL-JSON payload as returned by doi.org content negotiation.
#[derive(Debug, Deserialize)]
struct CslItem {
  /// CSL item type; absent in some registration agencies' output.
  #[serde(rename = "type")]
  kind:      Option<String>,
  /// Work title.
  title:     Option<String>,
  /// Author list, possibly mixing structured and literal names.
  #[serde(default)]
  author:    Vec<CslName>,
  /// Publisher name.
  publisher: Option<String>,
  /// Work URL.
  #[serde(rename = "URL")]
  url:       Option<String>,
  /// Issue date in `date-parts` shape.
  issued:    Option<IssueDate>,
}

/// One author entry of a CSL-JSON payload.
#[derive(Debug, Deserialize)]
struct CslName {
  /// Family name, when structured.
  family:  Option<String>,
  /// Given name, when structured.
  given:   Option<String>,
  /// Name suffix, when structured.
  suffix:  Option<String>,
  /// Single free-text name, when not structured.
  literal: Option<String>,
}

/// Client for fetching citation metadata for a DOI.
///
/// Issues one content-negotiated request per call against the doi.org
/// resolver and converts the CSL-JSON payload into a [`Record`].
pub struct DoiClient {
  /// Internal web client used to connect to the resolver.
  client:   reqwest::Client,
  /// The base URL to use for the client.
  base_url: String,
}

impl DoiClient {
  /// Creates a new DOI client instance.
  pub fn new() -> Self {
    Self {
      client:   reqwest::Client::builder()
                .user_agent("citer/0.1 (mailto:team@impactstory.org)")
                .build()
                .unwrap(),
      base_url: "https://doi.org".to_string(),
    }
  }

  /// Fetches the canonical record for a DOI.
  ///
  /// # Errors
  ///
  /// This function will return an error if:
  /// - The network request fails
  /// - The resolver answers with a non-success status
  /// - The payload cannot be parsed as CSL-JSON
  pub async fn fetch_record(&self, doi: &str) -> Result<Record, CiterError> {
    let url = format!("{}/{}", self.base_url, doi);
    debug!("Fetching DOI metadata via: {url}");

    let response = self.client.get(&url).header(reqwest::header::ACCEPT, ACCEPT_CSL_JSON).send().await?;
    let status = response.status();
    debug!("DOI resolver response status: {status}");

    if !status.is_success() {
      return Err(CiterError::NotFound);
    }

    let text = response.text().await?;
    let item: CslItem = serde_json::from_str(&text)
      .map_err(|e| CiterError::ApiError(format!("Failed to parse CSL-JSON: {e}")))?;

    let authors = item
      .author
      .into_iter()
      .map(|author| match author {
        CslName { family: Some(family), given, suffix, .. } => Name { family, given, suffix },
        CslName { literal: Some(literal), .. } => Name::from_literal(&literal),
        _ => Name { family: "Unknown".to_string(), given: None, suffix: None },
      })
      .collect();

    Ok(Record {
      kind: item.kind.unwrap_or_else(|| "misc".to_string()),
      title: item.title,
      authors,
      publisher: item.publisher,
      url: item.url,
      issued: item.issued,
      ..Record::misc(None)
    })
  }
}

impl Default for DoiClient {
  fn default() -> Self { Self::new() }
}

#[cfg(test)]
mod tests {
  use tracing_test::traced_test;

  use super::*;

  #[test]
  fn test_csl_item_parse() {
    let payload = r#"{
      "type": "article-journal",
      "title": "Instance selection of linear complexity for big data",
      "author": [
        {"family": "Arnaiz-Gonzalez", "given": "Alvar"},
        {"literal": "Impactstory"}
      ],
      "publisher": "Elsevier BV",
      "URL": "http://dx.doi.org/10.1016/j.knosys.2016.05.056",
      "issued": {"date-parts": [[2016, 9]]}
    }"#;

    let item: CslItem = serde_json::from_str(payload).unwrap();
    assert_eq!(item.kind.as_deref(), Some("article-journal"));
    assert_eq!(item.author.len(), 2);
    assert_eq!(item.issued.unwrap().year(), Some(2016));
  }

  #[ignore = "requires network access"]
  #[traced_test]
  #[tokio::test]
  async fn test_doi_fetch_live() -> anyhow::Result<()> {
    let record = DoiClient::new().fetch_record("10.5281/zenodo.50141").await?;

    assert!(!record.kind.is_empty());
    assert!(record.title.is_some());
    assert!(!record.authors.is_empty());
    Ok(())
  }
}
