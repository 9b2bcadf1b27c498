//! # gh-search
//!
//! A typed query layer over the GitHub search API: declare validated search
//! qualifiers, serialize them into the search syntax, and fetch as many pages
//! as a result limit requires.
//!
//! ## Main Components
//!
//! - [`Qualifier`] / [`Parameter`]: named, validated search fields behind the [`Field`] trait
//! - [`Query`]: keywords, kind, limit, ordering and qualifiers; renders the `q` string and URLs
//! - [`GitHubSearcher`]: paginated execution through an injected [`Transport`]
//! - [`Args`]: command line arguments for the `gh-search` binary
//!
//! ## Example
//!
//! ```no_run
//! use gh_search::{new_repos_query, Config, Field, GitHubSearcher, Searcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let mut query = new_repos_query();
//!     query.keywords = vec!["async runtime".to_string()];
//!     query.limit = 150;
//!     if let Some(stars) = query.qualifiers.get_mut("Stars") {
//!         stars.set(">=1000")?;
//!     }
//!
//!     let searcher = GitHubSearcher::from_config(&Config::resolve(None, None))?;
//!     let result = searcher.search(&query).await?;
//!     println!("{} of {}", result.items.len(), result.total_count);
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod error;
mod github_searcher;
mod qualifier;
mod query;
mod repos;
mod transport;

pub use crate::args::{Args, Command, ReposArgs};
pub use crate::config::{Config, DEFAULT_HOST};
pub use crate::error::{BoxError, HttpError, HttpErrorItem, Result, SearchError, ValidationError};
pub use crate::github_searcher::{page_plan, GitHubSearcher, Searcher, PAGE_SIZE};
pub use crate::qualifier::{
    bool_validator, date_validator, multi_opts_validator, opts_validator, range_validator, Field,
    FieldKind, Parameter, Qualifier, Validator,
};
pub use crate::query::{quote_keyword, Qualifiers, Query, SearchKind, SearchResult};
pub use crate::repos::{new_repos_query, render_table};
pub use crate::transport::{HttpRequest, HttpResponse, RateLimit, ReqwestTransport, Transport};
