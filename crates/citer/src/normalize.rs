//! Text normalization for cross-source title matching and license cleanup.
//!
//! Titles for the same work arrive spelled differently from every source:
//! different casing, stray punctuation, hyphenation variants, leftover HTML
//! from abstracts. [`normalize_title`] folds all of those into one lookup
//! key so that records from the open-access index can be matched back to
//! the subjects that mentioned them.
//!
//! [`find_normalized_license`] reduces the free-text rights statements
//! accumulated from index documents to a single canonical license code.
//!
//! # Examples
//!
//! ```
//! use citer::normalize::normalize_title;
//!
//! assert_eq!(
//!   normalize_title("The Structure of Scientific Revolutions"),
//!   normalize_title("structure-of-scientific-revolutions")
//! );
//! ```

use lazy_static::lazy_static;
use regex::Regex;

/// Normalizes a free-text title into a key for equality lookups.
///
/// The same semantic title must normalize identically regardless of case,
/// surrounding punctuation, or hyphenation, so the transform is lossy on
/// purpose:
/// - HTML tags are stripped
/// - the text is lower-cased
/// - leading English articles (`the`, `a`, `an`) are dropped as whole words
/// - every remaining non-alphanumeric character is removed
///
/// Always succeeds; empty input yields an empty key.
pub fn normalize_title(title: &str) -> String {
  lazy_static! {
    /// Matches HTML/XML tags left over from abstract markup.
    static ref TAGS: Regex = Regex::new(r"<[^>]+>").unwrap();
    /// Matches English articles as whole words.
    static ref ARTICLES: Regex = Regex::new(r"\b(the|a|an)\b").unwrap();
    /// Matches everything that is not a lowercase letter or digit.
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]").unwrap();
  }

  let lowered = TAGS.replace_all(title, " ").to_lowercase();
  let trimmed = ARTICLES.replace_all(&lowered, " ");
  NON_ALNUM.replace_all(&trimmed, "").into_owned()
}

/// Ordered license lookup table, most specific pattern first.
///
/// Patterns are matched against rights text folded by [`fold`], so both
/// spelled-out Creative Commons URLs and short codes collapse onto the
/// same entries.
const LICENSE_LOOKUPS: &[(&str, &str)] = &[
  ("creativecommons.org/licenses/byncnd", "cc-by-nc-nd"),
  ("ccbyncnd", "cc-by-nc-nd"),
  ("creativecommons.org/licenses/byncsa", "cc-by-nc-sa"),
  ("ccbyncsa", "cc-by-nc-sa"),
  ("creativecommons.org/licenses/bynd", "cc-by-nd"),
  ("ccbynd", "cc-by-nd"),
  ("creativecommons.org/licenses/bysa", "cc-by-sa"),
  ("ccbysa", "cc-by-sa"),
  ("creativecommons.org/licenses/bync", "cc-by-nc"),
  ("ccbync", "cc-by-nc"),
  ("creativecommons.org/licenses/by", "cc-by"),
  ("ccby", "cc-by"),
  ("creativecommons.org/publicdomain/zero", "cc0"),
  ("cc0", "cc0"),
  ("creativecommons.org/publicdomain", "pd"),
  ("publicdomain", "pd"),
];

/// Folds rights text for license matching: lower-case, spaces and hyphens
/// removed.
fn fold(text: &str) -> String {
  text.to_lowercase().replace([' ', '-'], "")
}

/// Reduces accumulated rights statements to one canonical license code.
///
/// Returns the first entry of the ordered lookup table found as a
/// substring of the folded text, or `None` when nothing is recognized.
///
/// # Examples
///
/// ```
/// use citer::normalize::find_normalized_license;
///
/// let rights = "Creative Commons Attribution-NonCommercial (CC BY-NC);";
/// assert_eq!(find_normalized_license(rights), Some("cc-by-nc".to_string()));
/// assert_eq!(find_normalized_license("all rights reserved"), None);
/// ```
pub fn find_normalized_license(text: &str) -> Option<String> {
  let folded = fold(text);
  LICENSE_LOOKUPS
    .iter()
    .find(|(pattern, _)| folded.contains(pattern))
    .map(|(_, license)| (*license).to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_title() {
    assert_eq!(normalize_title("Hello World"), "helloworld");
    assert_eq!(normalize_title("hello-world"), "helloworld");
    assert_eq!(normalize_title("HELLO, WORLD!"), "helloworld");
    assert_eq!(normalize_title("The Hello World"), "helloworld");
    assert_eq!(normalize_title("<i>Hello</i> World"), "helloworld");
    assert_eq!(normalize_title(""), "");
  }

  #[test]
  fn test_normalize_title_keeps_inner_articles_attached() {
    // "a"/"an" inside a word must survive
    assert_eq!(normalize_title("Analysis of Answers"), "analysisofanswers");
    assert_eq!(normalize_title("An Analysis"), "analysis");
  }

  #[test]
  fn test_find_normalized_license() {
    assert_eq!(
      find_normalized_license("http://creativecommons.org/licenses/by-nc-nd/4.0/"),
      Some("cc-by-nc-nd".to_string())
    );
    assert_eq!(find_normalized_license("CC BY 4.0;CC BY 4.0;"), Some("cc-by".to_string()));
    assert_eq!(find_normalized_license("Public Domain"), Some("pd".to_string()));
    assert_eq!(find_normalized_license("CC0 1.0"), Some("cc0".to_string()));
    assert_eq!(find_normalized_license("all rights reserved"), None);
    assert_eq!(find_normalized_license(""), None);
  }

  #[test]
  fn test_specific_license_wins_over_prefix() {
    // by-nc must not be shadowed by the plain by entry
    assert_eq!(
      find_normalized_license("https://creativecommons.org/licenses/by-nc/3.0/"),
      Some("cc-by-nc".to_string())
    );
  }
}
