//! The canonical bibliographic record and its building blocks.
//!
//! Every metadata source — DOI content negotiation, embedded citation
//! blocks, the GitHub API — is reduced to one [`Record`] with a fixed,
//! known key set before rendering. The serialized form uses CSL-compatible
//! key names (`type`, `author`, `URL`, `issued` as `date-parts`) so the
//! output of [`crate::subject::Subject::output`] reads like the citation
//! metadata other tools expect.
//!
//! # Examples
//!
//! ```
//! use citer::record::Record;
//!
//! let record = Record::from_bibtex("@misc{depsy, title={Depsy}, author={Jane Doe}, year={2015}}")?;
//! assert_eq!(record.title.as_deref(), Some("Depsy"));
//! assert_eq!(record.authors[0].family, "Doe");
//! # Ok::<(), citer::errors::CiterError>(())
//! ```

use biblatex::{Bibliography, Chunk, EntryType, Spanned};

use super::*;

/// Generational and academic suffixes recognized by the name heuristic.
const NAME_SUFFIXES: &[&str] = &["jr", "jr.", "sr", "sr.", "ii", "iii", "iv", "phd", "ph.d.", "md", "m.d."];

/// A structured personal name.
///
/// Literal one-token names (organizations, single-word handles) are kept
/// as a bare `family` with no `given` or `suffix`; everything else is
/// split by [`Name::from_literal`]. A record never mixes raw literal
/// strings with structured names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name {
  /// Family name, or the whole literal for single-token names.
  pub family: String,
  /// Given name(s), if the literal could be split.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub given:  Option<String>,
  /// Generational or academic suffix (Jr., III, ...), if present.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub suffix: Option<String>,
}

impl Name {
  /// Builds a structured name from a free-text literal.
  ///
  /// A literal with more than one space-separated token is split into
  /// family/given/suffix: the comma form (`"Doe, John"`) takes the part
  /// before the comma as the family name, otherwise the last token is the
  /// family name and a trailing suffix token is peeled off first. A
  /// single-token literal is kept as a bare family name.
  pub fn from_literal(literal: &str) -> Self {
    if let Some((family, rest)) = literal.split_once(',') {
      return Self {
        family: family.trim().to_string(),
        given:  non_empty(rest),
        suffix: None,
      };
    }

    let mut tokens: Vec<&str> = literal.split_whitespace().collect();
    match tokens.len() {
      0 => Self { family: String::new(), given: None, suffix: None },
      1 => Self { family: tokens[0].to_string(), given: None, suffix: None },
      _ => {
        let mut suffix = None;
        if tokens.len() > 2 && NAME_SUFFIXES.contains(&tokens[tokens.len() - 1].to_lowercase().as_str()) {
          suffix = tokens.pop().map(str::to_string);
        }
        let family = tokens.pop().unwrap_or_default().to_string();
        Self { family, given: Some(tokens.join(" ")), suffix }
      },
    }
  }
}

/// Trims a string and returns it only if something is left.
fn non_empty(text: &str) -> Option<String> {
  let trimmed = text.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// An issue date in CSL `date-parts` shape: `[[year, month, day]]` with
/// month and day optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDate {
  /// Date parts in the format `[[year, month, day]]`.
  #[serde(rename = "date-parts")]
  pub date_parts: Vec<Vec<i32>>,
}

impl IssueDate {
  /// Builds a year-precision date.
  pub fn from_year(year: i32) -> Self { Self { date_parts: vec![vec![year]] } }

  /// Returns the year component, if any.
  pub fn year(&self) -> Option<i32> { self.date_parts.first().and_then(|parts| parts.first()).copied() }
}

/// The canonical bibliographic record.
///
/// Invariant: `kind` is always set — sources that cannot say what they
/// describe produce the generic `misc` marker. Optional fields are left
/// out of the serialized form entirely rather than emitted as nulls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
  /// CSL item type (`software`, `article-journal`, `misc`, ...).
  #[serde(rename = "type")]
  pub kind:         String,
  /// Work title.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:        Option<String>,
  /// Structured author list.
  #[serde(rename = "author", skip_serializing_if = "Vec::is_empty", default)]
  pub authors:      Vec<Name>,
  /// Publisher name.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub publisher:    Option<String>,
  /// Work URL.
  #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
  pub url:          Option<String>,
  /// Issue date.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub issued:       Option<IssueDate>,
  /// Raw citation block captured from a repository, when one was found.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bibtex:       Option<String>,
  /// Canonical open-access license code, when one was recognized.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub license:      Option<String>,
  /// Best known open-access full-text URL.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub fulltext_url: Option<String>,
  /// Open-access repository URLs of unverified strength.
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub repo_urls:    Vec<String>,
}

impl Record {
  /// The minimal fallback record for subjects no richer source resolved.
  pub fn misc(url: Option<String>) -> Self {
    Self {
      kind:         "misc".to_string(),
      title:        None,
      authors:      Vec::new(),
      publisher:    None,
      url,
      issued:       None,
      bibtex:       None,
      license:      None,
      fulltext_url: None,
      repo_urls:    Vec::new(),
    }
  }

  /// The synthetic record for a repository with no embedded citation.
  pub fn software(title: String, author: Name, url: String, year: Option<i32>) -> Self {
    Self {
      kind: "software".to_string(),
      title: Some(title),
      authors: vec![author],
      publisher: Some("GitHub repository".to_string()),
      url: Some(url),
      issued: year.map(IssueDate::from_year),
      ..Self::misc(None)
    }
  }

  /// Parses an embedded citation block into a record.
  ///
  /// Only the first entry of the block is used. The raw block text is
  /// retained under `bibtex` so rendering failures can fall back to it.
  pub fn from_bibtex(raw: &str) -> Result<Self, CiterError> {
    let bibliography = Bibliography::parse(raw).map_err(|e| CiterError::Bibtex(e.to_string()))?;
    let entry = bibliography.iter().next().ok_or_else(|| CiterError::Bibtex("no entries found".to_string()))?;

    let authors = entry
      .author()
      .unwrap_or_default()
      .into_iter()
      .map(|person| Name {
        family: person.name,
        given:  non_empty(&person.given_name),
        suffix: non_empty(&person.suffix),
      })
      .collect();

    // `month` is never carried over: its dialects are too ambiguous to render.
    Ok(Self {
      kind: csl_type(&entry.entry_type).to_string(),
      title: entry.title().ok().map(|chunks| chunks_to_string(chunks)).and_then(|t| non_empty(&t)),
      authors,
      publisher: entry.get("publisher").map(chunks_to_string).and_then(|p| non_empty(&p)),
      url: entry.get("url").map(chunks_to_string).and_then(|u| non_empty(&u)),
      issued: entry
        .get("year")
        .map(chunks_to_string)
        .and_then(|y| y.trim().parse::<i32>().ok())
        .map(IssueDate::from_year),
      bibtex: Some(raw.to_string()),
      ..Self::misc(None)
    })
  }
}

/// Maps a bibtex entry type onto a CSL item type.
fn csl_type(entry_type: &EntryType) -> &'static str {
  match entry_type {
    EntryType::Article => "article-journal",
    EntryType::Book | EntryType::InBook | EntryType::Booklet => "book",
    EntryType::InProceedings | EntryType::Proceedings => "paper-conference",
    EntryType::Report => "report",
    EntryType::Thesis => "thesis",
    EntryType::Online => "webpage",
    EntryType::Software => "software",
    EntryType::Dataset => "dataset",
    _ => "misc",
  }
}

/// Flattens bibtex field chunks into a plain string.
fn chunks_to_string(chunks: &[Spanned<Chunk>]) -> String {
  chunks
    .iter()
    .map(|chunk| match &chunk.v {
      Chunk::Normal(s) => s.as_str(),
      Chunk::Verbatim(s) => s.as_str(),
      Chunk::Math(s) => s.as_str(),
    })
    .collect::<Vec<_>>()
    .join("")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_name_from_literal() {
    let name = Name::from_literal("Walter Holmgren");
    assert_eq!(name.family, "Holmgren");
    assert_eq!(name.given.as_deref(), Some("Walter"));
    assert_eq!(name.suffix, None);

    let name = Name::from_literal("Martin Luther King Jr.");
    assert_eq!(name.family, "King");
    assert_eq!(name.given.as_deref(), Some("Martin Luther"));
    assert_eq!(name.suffix.as_deref(), Some("Jr."));

    let name = Name::from_literal("Doe, John");
    assert_eq!(name.family, "Doe");
    assert_eq!(name.given.as_deref(), Some("John"));
  }

  #[test]
  fn test_single_token_literal_stays_literal() {
    let name = Name::from_literal("Impactstory");
    assert_eq!(name.family, "Impactstory");
    assert_eq!(name.given, None);
    assert_eq!(name.suffix, None);
  }

  #[test]
  fn test_from_bibtex_strips_month() {
    let block = "@article{key1, title={A Parallel Algorithm}, author={Jane Doe and John Q. Smith}, \
                 year={2013}, month={jan}, publisher={ACM}}";
    let record = Record::from_bibtex(block).unwrap();

    assert_eq!(record.kind, "article-journal");
    assert_eq!(record.title.as_deref(), Some("A Parallel Algorithm"));
    assert_eq!(record.authors.len(), 2);
    assert_eq!(record.authors[0].family, "Doe");
    assert_eq!(record.issued.as_ref().and_then(IssueDate::year), Some(2013));
    assert_eq!(record.bibtex.as_deref(), Some(block));

    let value = serde_json::to_value(&record).unwrap();
    assert!(value.get("month").is_none());
    assert_eq!(value["type"], "article-journal");
  }

  #[test]
  fn test_from_bibtex_rejects_garbage() {
    assert!(Record::from_bibtex("not a citation at all").is_err());
  }

  #[test]
  fn test_misc_record_always_has_type() {
    let record = Record::misc(Some("http://cnn.com".to_string()));
    assert_eq!(record.kind, "misc");

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["type"], "misc");
    assert_eq!(value["URL"], "http://cnn.com");
    assert!(value.get("author").is_none());
  }

  #[test]
  fn test_issue_date_round_trip() {
    let date: IssueDate = serde_json::from_value(serde_json::json!({"date-parts": [[2016, 5, 13]]})).unwrap();
    assert_eq!(date.year(), Some(2016));
    assert_eq!(serde_json::to_value(&IssueDate::from_year(2016)).unwrap()["date-parts"][0][0], 2016);
  }
}
