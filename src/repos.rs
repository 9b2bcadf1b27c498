//! Repository search: the qualifier table and the plain-text listing.

use std::fmt::Write as _;

use chrono::DateTime;
use console::{measure_text_width, pad_str, Alignment, Style};
use serde_json::{Map, Value};

use crate::qualifier::{
    bool_validator, date_validator, multi_opts_validator, opts_validator, range_validator,
    FieldKind, Parameter, Qualifier,
};
use crate::query::{Query, SearchKind, SearchResult};

/// A repository query with every supported qualifier present and unset.
pub fn new_repos_query() -> Query {
    use FieldKind::{Bool, String as Str, StringSlice};

    let range = |key: &str| Qualifier::new(key, Str, "", Some(range_validator()));
    let date = |key: &str| Qualifier::new(key, Str, "", Some(date_validator()));
    let text = |key: &str| Qualifier::new(key, StringSlice, "", None);
    let flag = |key: &str| Qualifier::new(key, Bool, "", Some(bool_validator()));

    Query {
        keywords: Vec::new(),
        kind: SearchKind::Repositories,
        limit: 30,
        order: Parameter::new("order", Str, "desc", Some(opts_validator(&["asc", "desc"]))),
        sort: Parameter::new(
            "sort",
            Str,
            "best match",
            Some(opts_validator(&["forks", "help-wanted-issues", "stars", "updated"])),
        ),
        qualifiers: [
            ("Archived", flag("archived")),
            ("Created", date("created")),
            ("Followers", range("followers")),
            (
                "Fork",
                Qualifier::new(
                    "fork",
                    Str,
                    "false",
                    Some(opts_validator(&["false", "true", "only"])),
                ),
            ),
            ("Forks", range("forks")),
            ("GoodFirstIssues", range("good-first-issues")),
            ("HelpWantedIssues", range("help-wanted-issues")),
            (
                "In",
                Qualifier::new(
                    "in",
                    StringSlice,
                    "name, description",
                    Some(multi_opts_validator(&["name", "description", "readme"])),
                ),
            ),
            ("Language", text("language")),
            ("License", text("license")),
            ("Mirror", flag("mirror")),
            ("Org", text("org")),
            ("Pushed", date("pushed")),
            ("Repo", text("repo")),
            ("Size", range("size")),
            ("Stars", range("stars")),
            ("Topic", text("topic")),
            ("Topics", range("topics")),
            ("User", text("user")),
            (
                "Visibility",
                Qualifier::new("is", Str, "all", Some(opts_validator(&["public", "private"]))),
            ),
        ]
        .into_iter()
        .collect(),
    }
}

/// Render repositories one per line: name, description, tags, last update.
///
/// Off a terminal, columns are tab separated. On a terminal they are padded to a
/// common width, timestamps are shown in RFC 2822 form and a summary line follows.
pub fn render_table(result: &SearchResult, tty: bool) -> String {
    let rows: Vec<[String; 4]> = result
        .items
        .iter()
        .map(|repo| {
            let updated_at = str_field(repo, "updated_at");
            let updated = if tty {
                DateTime::parse_from_rfc3339(updated_at)
                    .map(|t| t.to_rfc2822())
                    .unwrap_or_else(|_| updated_at.to_string())
            } else {
                updated_at.to_string()
            };
            [
                str_field(repo, "full_name").to_string(),
                collapse_whitespace(str_field(repo, "description")),
                tags(repo).join(", "),
                updated,
            ]
        })
        .collect();

    let mut out = String::new();
    if !tty {
        for row in &rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        return out;
    }

    let mut widths = [0usize; 3];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }
    for (row, repo) in rows.iter().zip(&result.items) {
        let [name, description, labels, updated] = row;
        let tag_style = if bool_field(repo, "private") {
            Style::new().yellow()
        } else {
            Style::new().dim()
        };
        let _ = writeln!(
            out,
            "{}{gap}{}{gap}{}{gap}{}",
            Style::new().bold().apply_to(pad_str(name, widths[0], Alignment::Left, None)),
            pad_str(description, widths[1], Alignment::Left, None),
            tag_style.apply_to(pad_str(labels, widths[2], Alignment::Left, None)),
            Style::new().dim().apply_to(updated),
            gap = COLUMN_GAP,
        );
    }

    if rows.is_empty() {
        out.push_str("\nNo repositories matched your search\n");
    } else {
        let _ = write!(
            out,
            "\nShowing {} of {} repositories\n",
            rows.len(),
            result.total_count
        );
    }
    out
}

const COLUMN_GAP: &str = "  ";

fn str_field<'a>(repo: &'a Map<String, Value>, key: &str) -> &'a str {
    repo.get(key).and_then(Value::as_str).unwrap_or("")
}

fn bool_field(repo: &Map<String, Value>, key: &str) -> bool {
    repo.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn tags(repo: &Map<String, Value>) -> Vec<&'static str> {
    let mut tags = vec![if bool_field(repo, "private") {
        "private"
    } else {
        "public"
    }];
    if bool_field(repo, "fork") {
        tags.push("fork");
    }
    if bool_field(repo, "archived") {
        tags.push("archived");
    }
    tags
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
