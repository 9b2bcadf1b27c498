use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::qualifier::Field;
use crate::query::Query;
use crate::repos::new_repos_query;

/// Search GitHub for repositories using typed, validated qualifiers.
#[derive(Parser)]
#[clap(
    author,
    version,
    about,
    long_about = "Search GitHub from the command line. Qualifier flags are checked locally before any request is made; the server remains the final judge of the query."
)]
pub struct Args {
    /// GitHub host to search, e.g. a GitHub Enterprise hostname.
    #[clap(long, global = true, value_name = "HOST")]
    pub hostname: Option<String>,

    /// GitHub API token for authentication.
    #[clap(short, long, global = true)]
    pub token: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search repositories.
    Repos(ReposArgs),
}

#[derive(clap::Args)]
pub struct ReposArgs {
    /// Search keywords. A `field:value` keyword keeps its field prefix unquoted.
    pub keywords: Vec<String>,

    /// Maximum number of repositories to fetch.
    #[clap(
        short = 'L',
        long,
        default_value_t = 30,
        value_parser = clap::value_parser!(u32).range(1..=1000)
    )]
    pub limit: u32,

    /// Order of repositories returned, ignored unless '--sort' is specified.
    #[clap(long, value_name = "string")]
    pub order: Option<String>,

    /// Sorts the repositories by stars, forks, help-wanted-issues, or updated.
    #[clap(long, value_name = "string")]
    pub sort: Option<String>,

    /// Filter based on archive state.
    #[clap(long, value_name = "bool")]
    pub archived: Option<String>,

    /// Filter based on created at date.
    #[clap(long, value_name = "date")]
    pub created: Option<String>,

    /// Filter based on number of followers.
    #[clap(long, value_name = "range")]
    pub followers: Option<String>,

    /// Include forks in search: false, true or only.
    #[clap(long, value_name = "string")]
    pub include_forks: Option<String>,

    /// Filter on number of forks.
    #[clap(long, value_name = "range")]
    pub forks: Option<String>,

    /// Filter on number of issues with the 'good first issue' label.
    #[clap(long, value_name = "range")]
    pub good_first_issues: Option<String>,

    /// Filter on number of issues with the 'help wanted' label.
    #[clap(long, value_name = "range")]
    pub help_wanted_issues: Option<String>,

    /// Restrict search to the name, description, or README file.
    #[clap(long = "in", value_name = "stringSlice")]
    pub within: Option<String>,

    /// Filter based on the coding language.
    #[clap(long, value_name = "stringSlice")]
    pub language: Option<String>,

    /// Filter based on license type.
    #[clap(long, value_name = "stringSlice")]
    pub license: Option<String>,

    /// Filter based on mirror state.
    #[clap(long, value_name = "bool")]
    pub mirror: Option<String>,

    /// Filter on organization.
    #[clap(long, value_name = "stringSlice")]
    pub org: Option<String>,

    /// Filter on last updated at date.
    #[clap(long, value_name = "date")]
    pub updated: Option<String>,

    /// Filter on repository name.
    #[clap(long, value_name = "stringSlice")]
    pub repo: Option<String>,

    /// Filter on a size range, in kilobytes.
    #[clap(long, value_name = "range")]
    pub size: Option<String>,

    /// Filter on number of stars.
    #[clap(long, value_name = "range")]
    pub stars: Option<String>,

    /// Filter on topic.
    #[clap(long, value_name = "stringSlice")]
    pub topic: Option<String>,

    /// Filter on number of topics.
    #[clap(long, value_name = "range")]
    pub number_topics: Option<String>,

    /// Filter based on user.
    #[clap(long, value_name = "stringSlice")]
    pub user: Option<String>,

    /// Filter based on visibility: public or private.
    #[clap(long, value_name = "string")]
    pub visibility: Option<String>,

    /// Print the search URL for the browser instead of searching.
    #[clap(short, long, conflicts_with = "json")]
    pub web: bool,

    /// Print matching repositories as a JSON array.
    #[clap(long)]
    pub json: bool,
}

impl ReposArgs {
    /// Build the repository query, passing each supplied flag through its validator.
    ///
    /// The first rejected value aborts with its validation error.
    pub fn to_query(&self) -> Result<Query> {
        let mut query = new_repos_query();
        query.keywords = self.keywords.clone();
        query.limit = self.limit;

        if let Some(order) = &self.order {
            query.order.set(order)?;
        }
        if let Some(sort) = &self.sort {
            query.sort.set(sort)?;
        }

        for (name, value) in self.qualifier_values() {
            let (Some(value), Some(qualifier)) = (value, query.qualifiers.get_mut(name)) else {
                continue;
            };
            qualifier.set(value)?;
        }
        Ok(query)
    }

    fn qualifier_values(&self) -> [(&'static str, Option<&str>); 20] {
        [
            ("Archived", self.archived.as_deref()),
            ("Created", self.created.as_deref()),
            ("Followers", self.followers.as_deref()),
            ("Fork", self.include_forks.as_deref()),
            ("Forks", self.forks.as_deref()),
            ("GoodFirstIssues", self.good_first_issues.as_deref()),
            ("HelpWantedIssues", self.help_wanted_issues.as_deref()),
            ("In", self.within.as_deref()),
            ("Language", self.language.as_deref()),
            ("License", self.license.as_deref()),
            ("Mirror", self.mirror.as_deref()),
            ("Org", self.org.as_deref()),
            ("Pushed", self.updated.as_deref()),
            ("Repo", self.repo.as_deref()),
            ("Size", self.size.as_deref()),
            ("Stars", self.stars.as_deref()),
            ("Topic", self.topic.as_deref()),
            ("Topics", self.number_topics.as_deref()),
            ("User", self.user.as_deref()),
            ("Visibility", self.visibility.as_deref()),
        ]
    }
}
