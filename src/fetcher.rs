use std::collections::HashMap;
use std::time::Duration;

use feed_rs::parser;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::feed::{main_link, Entry};

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed feed: {0}")]
    Parse(#[from] parser::ParseFeedError),
}

/// Anything that can turn a feed URL into entries.
#[allow(async_fn_in_trait)]
pub trait FeedSource {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<Entry>, FetchError>;
}

pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl FeedSource for Fetcher {
    async fn fetch_entries(&self, url: &str) -> Result<Vec<Entry>, FetchError> {
        info!("Fetching feed: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;

        let entries = parse_entries(&bytes)?;
        info!("Parsed {} entries from {}", entries.len(), url);
        Ok(entries)
    }
}

/// Parse a raw RSS/Atom document into entries, in feed order.
pub fn parse_entries(xml: &[u8]) -> Result<Vec<Entry>, FetchError> {
    // feed_rs doesn't parse the RSS <comments> element
    let comments_map = extract_comments_from_xml(xml);

    let parsed = parser::parse(xml)?;

    let entries = parsed
        .entries
        .iter()
        .map(|entry| {
            let link = main_link(entry).unwrap_or_default();
            let comments = extract_discussion_link(entry, comments_map.get(&link), &link);
            Entry::from_feed(entry, comments)
        })
        .collect();

    Ok(entries)
}

/// Map of item link to <comments> URL, scraped from raw RSS XML
pub fn extract_comments_from_xml(xml_bytes: &[u8]) -> HashMap<String, String> {
    let mut comments_map = HashMap::new();
    let xml_str = match std::str::from_utf8(xml_bytes) {
        Ok(s) => s,
        Err(_) => return comments_map,
    };

    for item_block in xml_str.split("<item>").skip(1) {
        let item_end = item_block.find("</item>").unwrap_or(item_block.len());
        let item = &item_block[..item_end];

        let link = extract_xml_element(item, "link");
        let comments = extract_xml_element(item, "comments");

        if let (Some(link), Some(comments)) = (link, comments) {
            comments_map.insert(link, comments);
        }
    }

    debug!("Found {} <comments> elements", comments_map.len());
    comments_map
}

pub fn extract_xml_element(xml: &str, tag: &str) -> Option<String> {
    let start_tag = format!("<{}>", tag);
    let end_tag = format!("</{}>", tag);

    let start = xml.find(&start_tag)? + start_tag.len();
    let end = xml[start..].find(&end_tag)? + start;

    Some(unescape_xml(xml[start..end].trim()))
}

fn unescape_xml(text: &str) -> String {
    // &amp; last so "&amp;lt;" stays "&lt;"
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Where the discussion for `entry` lives, if anywhere.
///
/// Order: the RSS <comments> element, then a `replies`/`comments` link, then
/// a Hacker News item guid that differs from the story link.
pub fn extract_discussion_link(
    entry: &feed_rs::model::Entry,
    comments_from_xml: Option<&String>,
    main_link: &str,
) -> Option<String> {
    if let Some(comments_url) = comments_from_xml {
        return Some(comments_url.clone());
    }

    for link in &entry.links {
        let rel = link.rel.as_deref().unwrap_or("").to_lowercase();
        if rel == "replies" || rel == "comments" {
            return Some(link.href.clone());
        }
    }

    // Ask HN posts link straight to the discussion
    if entry.id.contains("news.ycombinator.com/item?id=") && entry.id != main_link {
        return Some(entry.id.clone());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_rs::model::Link;

    fn create_test_entry(id: &str, links: Vec<(&str, Option<&str>)>) -> feed_rs::model::Entry {
        feed_rs::model::Entry {
            id: id.to_string(),
            links: links
                .into_iter()
                .map(|(href, rel)| Link {
                    href: href.to_string(),
                    rel: rel.map(|r| r.to_string()),
                    media_type: None,
                    href_lang: None,
                    title: None,
                    length: None,
                })
                .collect(),
            ..Default::default()
        }
    }

    const HN_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Hacker News</title>
    <link>https://news.ycombinator.com/</link>
    <description>Links for the intellectually curious, ranked by readers.</description>
    <item>
      <title>Show HN: A terminal RSS reader</title>
      <link>https://example.com/reader</link>
      <pubDate>Mon, 10 Jun 2024 14:30:00 +0000</pubDate>
      <comments>https://news.ycombinator.com/item?id=100</comments>
      <description><![CDATA[<a href="https://news.ycombinator.com/item?id=100">Comments</a>]]></description>
    </item>
    <item>
      <title>Ask HN: What are you reading?</title>
      <link>https://news.ycombinator.com/item?id=101</link>
      <pubDate>Mon, 10 Jun 2024 13:00:00 +0000</pubDate>
      <comments>https://news.ycombinator.com/item?id=101</comments>
    </item>
    <item>
      <link>https://example.com/untitled</link>
    </item>
  </channel>
</rss>"#;

    mod extract_xml_element_tests {
        use super::*;

        #[test]
        fn test_extract_simple_element() {
            let result = extract_xml_element("<title>Hello World</title>", "title");
            assert_eq!(result, Some("Hello World".to_string()));
        }

        #[test]
        fn test_extract_element_with_whitespace() {
            let result = extract_xml_element("<link>  https://example.com  </link>", "link");
            assert_eq!(result, Some("https://example.com".to_string()));
        }

        #[test]
        fn test_extract_element_not_found() {
            assert_eq!(extract_xml_element("<title>Hello</title>", "link"), None);
        }

        #[test]
        fn test_extract_element_no_closing_tag() {
            assert_eq!(extract_xml_element("<title>Hello", "title"), None);
        }

        #[test]
        fn test_extract_first_element_when_multiple() {
            let result = extract_xml_element("<link>first</link><link>second</link>", "link");
            assert_eq!(result, Some("first".to_string()));
        }

        #[test]
        fn test_extract_unescapes_entities() {
            let xml = "<link>https://example.com/?a=1&amp;b=2</link>";
            let result = extract_xml_element(xml, "link");
            assert_eq!(result, Some("https://example.com/?a=1&b=2".to_string()));
        }
    }

    mod extract_comments_from_xml_tests {
        use super::*;

        #[test]
        fn test_extract_items_with_and_without_comments() {
            let xml = r#"
                <rss>
                    <channel>
                        <item>
                            <link>https://article1.com</link>
                            <comments>https://forum.com/1</comments>
                        </item>
                        <item>
                            <link>https://article2.com</link>
                        </item>
                    </channel>
                </rss>
            "#;

            let result = extract_comments_from_xml(xml.as_bytes());
            assert_eq!(result.len(), 1);
            assert_eq!(
                result.get("https://article1.com"),
                Some(&"https://forum.com/1".to_string())
            );
        }

        #[test]
        fn test_extract_invalid_utf8() {
            let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
            assert!(extract_comments_from_xml(&invalid_bytes).is_empty());
        }

        #[test]
        fn test_extract_no_items() {
            let xml = "<rss><channel><title>Empty Feed</title></channel></rss>";
            assert!(extract_comments_from_xml(xml.as_bytes()).is_empty());
        }
    }

    mod extract_discussion_link_tests {
        use super::*;

        #[test]
        fn test_xml_comments_take_precedence() {
            let entry = create_test_entry(
                "123",
                vec![
                    ("https://article.com", None),
                    ("https://forum.example.com/fallback", Some("replies")),
                ],
            );
            let comments_url = "https://forum.example.com/preferred".to_string();

            let result = extract_discussion_link(&entry, Some(&comments_url), "https://article.com");
            assert_eq!(result, Some(comments_url));
        }

        #[test]
        fn test_case_insensitive_rel_matching() {
            let entry = create_test_entry(
                "123",
                vec![
                    ("https://blog.example.com/post/1", None),
                    ("https://blog.example.com/post/1/comments", Some("COMMENTS")),
                ],
            );

            let result = extract_discussion_link(&entry, None, "https://blog.example.com/post/1");
            assert_eq!(
                result,
                Some("https://blog.example.com/post/1/comments".to_string())
            );
        }

        #[test]
        fn test_hn_guid_used_as_discussion() {
            let entry = create_test_entry(
                "https://news.ycombinator.com/item?id=12345",
                vec![("https://article.example.com", None)],
            );

            let result = extract_discussion_link(&entry, None, "https://article.example.com");
            assert_eq!(
                result,
                Some("https://news.ycombinator.com/item?id=12345".to_string())
            );
        }

        #[test]
        fn test_hn_guid_skipped_when_it_is_the_main_link() {
            let entry = create_test_entry(
                "https://news.ycombinator.com/item?id=12345",
                vec![("https://news.ycombinator.com/item?id=12345", None)],
            );

            let result = extract_discussion_link(
                &entry,
                None,
                "https://news.ycombinator.com/item?id=12345",
            );
            assert_eq!(result, None);
        }

        #[test]
        fn test_no_discussion_link_found() {
            let entry = create_test_entry("123", vec![("https://article.com", None)]);
            assert_eq!(extract_discussion_link(&entry, None, "https://article.com"), None);
        }
    }

    mod parse_entries_tests {
        use super::*;

        #[test]
        fn test_parse_hacker_news_format() {
            let entries = parse_entries(HN_SAMPLE.as_bytes()).unwrap();
            assert_eq!(entries.len(), 3);

            let first = &entries[0];
            assert_eq!(first.title, "Show HN: A terminal RSS reader");
            assert_eq!(first.link, "https://example.com/reader");
            assert_eq!(first.author, "Unknown");
            assert!(first.published.is_some());
            assert_eq!(
                first.comments.as_deref(),
                Some("https://news.ycombinator.com/item?id=100")
            );
        }

        #[test]
        fn test_parse_preserves_feed_order() {
            let entries = parse_entries(HN_SAMPLE.as_bytes()).unwrap();
            assert_eq!(entries[1].title, "Ask HN: What are you reading?");
        }

        #[test]
        fn test_parse_missing_title_defaults() {
            let entries = parse_entries(HN_SAMPLE.as_bytes()).unwrap();
            let untitled = &entries[2];
            assert_eq!(untitled.title, "No title");
            assert_eq!(untitled.link, "https://example.com/untitled");
            assert!(untitled.published.is_none());
            assert!(untitled.comments.is_none());
        }

        #[test]
        fn test_parse_author() {
            let xml = r#"<?xml version="1.0"?>
                <rss version="2.0"><channel><title>t</title>
                <item><title>Story</title><link>https://a.example</link>
                <author>jane@example.com (Jane)</author></item>
                </channel></rss>"#;

            let entries = parse_entries(xml.as_bytes()).unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].author, "Jane");
        }

        #[test]
        fn test_parse_dublin_core_creator() {
            let xml = r#"<?xml version="1.0"?>
                <rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
                <channel><title>t</title>
                <item><title>Story</title><link>https://a.example</link>
                <dc:creator>dang</dc:creator></item>
                </channel></rss>"#;

            let entries = parse_entries(xml.as_bytes()).unwrap();
            assert_eq!(entries[0].author, "dang");
        }

        #[test]
        fn test_parse_empty_channel() {
            let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title></channel></rss>"#;
            let entries = parse_entries(xml.as_bytes()).unwrap();
            assert!(entries.is_empty());
        }

        #[test]
        fn test_parse_malformed_xml() {
            let result = parse_entries(b"<html><body>Service Unavailable</body></html>");
            assert!(matches!(result, Err(FetchError::Parse(_))));
        }

        #[test]
        fn test_parse_garbage() {
            let result = parse_entries(b"not xml at all");
            assert!(matches!(result, Err(FetchError::Parse(_))));
        }
    }

    mod fetcher_tests {
        use super::*;

        #[test]
        fn test_fetcher_builds_with_default_config() {
            assert!(Fetcher::new(&Config::default()).is_ok());
        }

        #[test]
        fn test_fetcher_builds_with_timeout() {
            let config = Config {
                request_timeout_secs: Some(5),
                ..Config::default()
            };
            assert!(Fetcher::new(&config).is_ok());
        }

        #[tokio::test]
        async fn test_fetch_unreachable_host_is_http_error() {
            let fetcher = Fetcher::new(&Config::default()).unwrap();
            // port 9 (discard) on localhost is not expected to serve HTTP
            let result = fetcher.fetch_entries("http://127.0.0.1:9/rss").await;
            assert!(matches!(result, Err(FetchError::Http(_))));
        }
    }
}
