//! A library for resolving citations for software and datasets from URLs
//! and DOIs, using metadata from DOI content negotiation, the GitHub API,
//! embedded citation files, and the BASE open-access search index.
//!
//! # Example
//! ```rust,no_run
//! use citer::subject::Resolver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!   let resolver = Resolver::default();
//!   let subject = resolver.resolve("https://github.com/impactstory/depsy").await?;
//!   println!("{}", subject.output()?.citation);
//!
//!   Ok(())
//! }
//! ```

#![warn(missing_docs, clippy::missing_docs_in_private_items)]
use std::{str::FromStr, time::Duration};

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod clients;
pub mod errors;
pub mod normalize;
pub mod record;
pub mod render;
pub mod subject;
#[cfg(test)] mod tests;

use clients::{
  doi::DoiClient,
  github::{Credentials, GithubClient},
};
use errors::CiterError;
use record::{IssueDate, Name, Record};
use subject::{OaStatus, Subject};
