//! Citation rendering through the CSL style grammar.
//!
//! The canonical record is bridged into a single-entry bibliography
//! library (hayagriva's YAML input format, keyed by a fixed internal
//! identifier), fed through an archived CSL style, formatted as HTML, and
//! un-escaped back to plain readable text. Rendering is deterministic:
//! the same record and style always produce the same text.
//!
//! A rendering failure falls back to the raw captured citation block when
//! the record carries one; only a record with no such block surfaces the
//! error. An unknown style name is reported before rendering starts and
//! never falls back.
//!
//! # Examples
//!
//! ```
//! use citer::{record::Record, render};
//!
//! let record = Record::misc(Some("http://cnn.com".to_string()));
//! let citation = render::render(&record, render::DEFAULT_STYLE)?;
//! assert!(citation.contains("cnn.com"));
//! # Ok::<(), citer::errors::CiterError>(())
//! ```

use hayagriva::{
  archive::{locales, ArchivedStyle},
  citationberg::{IndependentStyle, Style},
  BibliographyDriver, BibliographyRequest, BufWriteFormat, CitationItem, CitationRequest,
};

use super::*;

/// Default citation style: the Harvard author-date form.
pub const DEFAULT_STYLE: &str = "harvard-cite-them-right";

/// Fixed key of the single entry fed to the style grammar.
const ITEM_KEY: &str = "item-1";

/// Renders the canonical record with the named style.
///
/// # Errors
///
/// Returns an error when the style name is unknown, or when rendering
/// fails and the record carries no raw citation block to fall back on.
pub fn render(record: &Record, style_name: &str) -> Result<String, CiterError> {
  let style = archived_style(style_name)?;

  match render_with_style(record, &style) {
    Ok(text) => Ok(text),
    Err(e) => match &record.bibtex {
      Some(bibtex) => {
        warn!("Citation rendering failed, falling back to raw citation text: {e}");
        Ok(bibtex.clone())
      },
      None => Err(e),
    },
  }
}

/// Looks up an archived CSL style by name, resolving a few common
/// aliases first.
fn archived_style(name: &str) -> Result<IndependentStyle, CiterError> {
  let key = match name {
    "harvard" | "harvard1" => DEFAULT_STYLE,
    "mla" => "modern-language-association",
    "chicago" => "chicago-author-date",
    other => other,
  };

  let style =
    ArchivedStyle::by_name(key).ok_or_else(|| CiterError::InvalidStyle(name.to_string()))?.get();
  match style {
    Style::Independent(style) => Ok(style),
    _ => Err(CiterError::InvalidStyle(name.to_string())),
  }
}

/// Drives the style grammar over the record and returns plain text.
fn render_with_style(record: &Record, style: &IndependentStyle) -> Result<String, CiterError> {
  let yaml = to_yaml(record)?;
  let library = hayagriva::io::from_yaml_str(&yaml).map_err(|e| CiterError::Render(e.to_string()))?;
  let entry =
    library.iter().next().ok_or_else(|| CiterError::Render("empty bibliography source".to_string()))?;

  let locales = locales();
  let mut driver = BibliographyDriver::new();
  driver.citation(CitationRequest::from_items(vec![CitationItem::with_entry(entry)], style, &locales));
  let rendered = driver.finish(BibliographyRequest { style, locale: None, locale_files: &locales });

  let item = rendered
    .bibliography
    .and_then(|bibliography| bibliography.items.into_iter().next())
    .ok_or_else(|| CiterError::Render("style produced no bibliography".to_string()))?;

  let mut html = String::new();
  item.content.write_buf(&mut html, BufWriteFormat::Html).map_err(|e| CiterError::Render(e.to_string()))?;

  Ok(unescape_entities(&html))
}

/// Bridges the record into the bibliography library's YAML document form.
fn to_yaml(record: &Record) -> Result<String, CiterError> {
  use serde_yaml::{Mapping, Value};

  // a bare URL with no richer fields is a site reference as far as the
  // style grammar is concerned
  let kind = if record.kind == "misc" && record.title.is_none() && record.url.is_some() {
    "web"
  } else {
    entry_kind(&record.kind)
  };

  let mut entry = Mapping::new();
  entry.insert("type".into(), Value::from(kind));
  if let Some(title) = &record.title {
    entry.insert("title".into(), Value::from(title.as_str()));
  }
  if !record.authors.is_empty() {
    entry.insert("author".into(), Value::Sequence(record.authors.iter().map(person_value).collect()));
  }
  if let Some(publisher) = &record.publisher {
    entry.insert("publisher".into(), Value::from(publisher.as_str()));
  }
  if let Some(url) = &record.url {
    entry.insert("url".into(), Value::from(url.as_str()));
  }
  if let Some(year) = record.issued.as_ref().and_then(IssueDate::year) {
    entry.insert("date".into(), Value::from(year));
  }

  let mut document = Mapping::new();
  document.insert(ITEM_KEY.into(), Value::Mapping(entry));
  serde_yaml::to_string(&document).map_err(|e| CiterError::Render(e.to_string()))
}

/// Maps a CSL item type onto the bibliography library's entry kinds.
fn entry_kind(kind: &str) -> &'static str {
  match kind {
    "software" | "dataset" => "repository",
    "webpage" | "post-weblog" => "web",
    "article" | "article-journal" | "paper-conference" => "article",
    "book" => "book",
    "report" => "report",
    "thesis" => "thesis",
    _ => "misc",
  }
}

/// Builds the YAML value for one structured name.
fn person_value(name: &Name) -> serde_yaml::Value {
  let mut person = serde_yaml::Mapping::new();
  person.insert("name".into(), name.family.as_str().into());
  if let Some(given) = &name.given {
    person.insert("given-name".into(), given.as_str().into());
  }
  if let Some(suffix) = &name.suffix {
    person.insert("suffix".into(), suffix.as_str().into());
  }
  serde_yaml::Value::Mapping(person)
}

/// Un-escapes HTML entities left by the HTML formatter.
///
/// Text that fails to un-escape (stray ampersands and the like) is
/// returned as-is rather than failing the render.
fn unescape_entities(text: &str) -> String {
  match quick_xml::escape::unescape(text) {
    Ok(unescaped) => unescaped.into_owned(),
    Err(_) => text.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  /// The synthetic record the pipeline builds for a bare repository.
  fn software_record() -> Record {
    Record::software(
      "depsy".to_string(),
      Name::from_literal("Impactstory"),
      "https://github.com/impactstory/depsy".to_string(),
      Some(2015),
    )
  }

  #[test]
  fn test_render_misc_record_mentions_url() {
    let record = Record::misc(Some("http://cnn.com".to_string()));
    let citation = render(&record, DEFAULT_STYLE).unwrap();
    assert!(citation.contains("cnn.com"), "citation was: {citation}");
  }

  #[test]
  fn test_render_software_record() {
    let citation = render(&software_record(), DEFAULT_STYLE).unwrap();
    assert!(citation.contains("Impactstory"), "citation was: {citation}");
    assert!(citation.contains("2015"), "citation was: {citation}");
  }

  #[test]
  fn test_render_is_idempotent() {
    let record = software_record();
    assert_eq!(render(&record, DEFAULT_STYLE).unwrap(), render(&record, DEFAULT_STYLE).unwrap());
  }

  #[test]
  fn test_render_accepts_style_aliases() {
    let record = software_record();
    assert_eq!(render(&record, "harvard1").unwrap(), render(&record, DEFAULT_STYLE).unwrap());
  }

  #[test]
  fn test_render_rejects_unknown_style() {
    let record = Record::misc(None);
    assert!(matches!(render(&record, "no-such-style"), Err(CiterError::InvalidStyle(_))));
  }

  #[test]
  fn test_unescape_entities() {
    assert_eq!(unescape_entities("Tom &amp; Jerry"), "Tom & Jerry");
    assert_eq!(unescape_entities("nothing escaped"), "nothing escaped");
    // malformed escapes degrade to the original text
    assert_eq!(unescape_entities("broken &amp entity"), "broken &amp entity");
  }

  #[test]
  fn test_to_yaml_shape() {
    let yaml = to_yaml(&software_record()).unwrap();
    assert!(yaml.contains("type: repository"));
    assert!(yaml.contains("name: Impactstory"));
    assert!(yaml.contains("date: 2015"));
  }
}
