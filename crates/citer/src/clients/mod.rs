//! Client implementations for the external metadata sources.
//!
//! Each submodule wraps one outside collaborator behind a small client
//! struct and converts its wire format into the pipeline's own types:
//!
//! - [`doi`] - DOI content negotiation against doi.org
//! - [`github`] - repository attributes and embedded citation files
//! - [`base`] - batched open-access lookups against BASE
//!
//! Every client performs exactly one blocking round trip per call with a
//! fixed timeout and no retries; retry policy, if any, belongs to the
//! caller's transport layer.
//!
//! # Examples
//!
//! ```no_run
//! use citer::clients::doi::DoiClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let record = DoiClient::new().fetch_record("10.5281/zenodo.50141").await?;
//! println!("Title: {:?}", record.title);
//! # Ok(())
//! # }
//! ```

pub mod base;
pub mod doi;
pub mod github;

pub use base::OpenAccessClient;
pub use doi::DoiClient;
pub use github::{Credentials, GithubClient};

use super::*;
