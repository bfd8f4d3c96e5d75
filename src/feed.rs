use chrono::{DateTime, Utc};
use feed_rs::model::Person;

pub const NO_TITLE: &str = "No title";
pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// One story from the feed, with display defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub title: String,
    pub link: String,
    pub author: String,
    pub published: Option<DateTime<Utc>>,
    pub comments: Option<String>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            title: NO_TITLE.to_string(),
            link: String::new(),
            author: UNKNOWN_AUTHOR.to_string(),
            published: None,
            comments: None,
        }
    }
}

impl Entry {
    /// Build an entry from a parsed feed item. `comments` is resolved by the
    /// caller since feed_rs has no field for it.
    pub fn from_feed(entry: &feed_rs::model::Entry, comments: Option<String>) -> Self {
        let title = entry
            .title
            .as_ref()
            .map(|t| t.content.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| NO_TITLE.to_string());

        let author = entry
            .authors
            .first()
            .map(author_name)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        Self {
            title,
            link: main_link(entry).unwrap_or_default(),
            author,
            published: entry.published.or(entry.updated),
            comments,
        }
    }
}

/// Display name of a feed author.
///
/// feed_rs files an RSS `<author>` element under the name "author" with the
/// element text as the email, which is conventionally `addr (Real Name)`.
fn author_name(person: &Person) -> &str {
    match person.email.as_deref() {
        Some(email) if person.name == "author" => {
            let email = email.trim();
            email
                .strip_suffix(')')
                .and_then(|rest| rest.split_once('('))
                .map(|(_, name)| name.trim())
                .filter(|name| !name.is_empty())
                .unwrap_or(email)
        }
        _ => person.name.trim(),
    }
}

pub fn main_link(entry: &feed_rs::model::Entry) -> Option<String> {
    entry.links.first().map(|l| l.href.clone())
}
