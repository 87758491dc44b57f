//! RSS 2.0 and Atom 1.0 feeds over the collated posts.

use thiserror::Error;
use time::OffsetDateTime;
use url::Url;

use crate::{
    application::site::Site,
    config::SiteSettings,
    domain::{
        dates::{format_rfc2822, format_rfc3339},
        document::Document,
    },
};

pub const RSS_FILE: &str = "posts.xml";
pub const ATOM_FILE: &str = "atom.xml";

#[derive(Debug, Error)]
pub enum SyndicationError {
    #[error("site url `{url}` cannot be used as a feed base: {source}")]
    Base {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("post url `{url}` cannot be made absolute: {source}")]
    Link {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

struct FeedItem<'a> {
    post: &'a Document,
    link: String,
}

fn feed_items<'a>(
    settings: &SiteSettings,
    site: &'a Site,
) -> Result<(Url, Vec<FeedItem<'a>>), SyndicationError> {
    let base = site_base(settings)?;
    let items = site
        .posts
        .iter()
        .map(|post| {
            absolute_url(&base, &post.meta.url).map(|link| FeedItem { post, link })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((base, items))
}

/// Generate RSS 2.0 feed XML.
pub fn rss_feed(settings: &SiteSettings, site: &Site) -> Result<String, SyndicationError> {
    let (base, items) = feed_items(settings, site)?;

    let mut body = String::new();
    for FeedItem { post, link } in items {
        body.push_str("    <item>\n");
        body.push_str(&format!("      <title>{}</title>\n", xml_escape(&post.meta.title)));
        body.push_str(&format!("      <link>{}</link>\n", xml_escape(&link)));
        body.push_str(&format!(
            "      <guid isPermaLink=\"true\">{}</guid>\n",
            xml_escape(&link)
        ));
        if let Some(date) = post.meta.date {
            body.push_str(&format!("      <pubDate>{}</pubDate>\n", format_rfc2822(date)));
        }
        for tag in &post.meta.tags {
            body.push_str(&format!("      <category>{}</category>\n", xml_escape(tag)));
        }
        body.push_str(&format!(
            "      <description>{}</description>\n",
            cdata(&post.meta.summary)
        ));
        body.push_str("    </item>\n");
    }

    let feed_link = absolute_url(&base, RSS_FILE)?;
    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n  <channel>\n    <title>{}</title>\n    <link>{}</link>\n    <description>{}</description>\n    <language>{}</language>\n    <atom:link href=\"{}\" rel=\"self\" type=\"application/rss+xml\"/>\n{}  </channel>\n</rss>\n",
        xml_escape(&settings.title),
        xml_escape(base.as_str()),
        xml_escape(&settings.description),
        xml_escape(&settings.language),
        xml_escape(&feed_link),
        body
    ))
}

/// Generate Atom 1.0 feed XML.
pub fn atom_feed(settings: &SiteSettings, site: &Site) -> Result<String, SyndicationError> {
    let (base, items) = feed_items(settings, site)?;

    let updated = site
        .posts
        .iter()
        .filter_map(|post| post.meta.date)
        .max()
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    let mut entries = String::new();
    for FeedItem { post, link } in items {
        let stamp = format_rfc3339(post.meta.date.unwrap_or(updated));
        entries.push_str("  <entry>\n");
        entries.push_str(&format!("    <title>{}</title>\n", xml_escape(&post.meta.title)));
        entries.push_str(&format!("    <link href=\"{}\"/>\n", xml_escape(&link)));
        entries.push_str(&format!("    <id>{}</id>\n", xml_escape(&link)));
        entries.push_str(&format!("    <published>{stamp}</published>\n"));
        entries.push_str(&format!("    <updated>{stamp}</updated>\n"));
        for tag in &post.meta.tags {
            entries.push_str(&format!("    <category term=\"{}\"/>\n", xml_escape(tag)));
        }
        entries.push_str(&format!(
            "    <summary type=\"html\">{}</summary>\n",
            cdata(&post.meta.summary)
        ));
        entries.push_str("  </entry>\n");
    }

    let author = if settings.author.is_empty() {
        String::new()
    } else {
        format!("  <author><name>{}</name></author>\n", xml_escape(&settings.author))
    };
    let self_link = absolute_url(&base, ATOM_FILE)?;

    Ok(format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\">\n  <title>{}</title>\n  <id>{}</id>\n  <updated>{}</updated>\n  <link href=\"{}\"/>\n  <link href=\"{}\" rel=\"self\"/>\n{}{}</feed>\n",
        xml_escape(&settings.title),
        xml_escape(base.as_str()),
        format_rfc3339(updated),
        xml_escape(base.as_str()),
        xml_escape(&self_link),
        author,
        entries
    ))
}

pub(crate) fn site_base(settings: &SiteSettings) -> Result<Url, SyndicationError> {
    // A trailing slash keeps the last path segment when joining.
    Url::parse(&format!("{}/", settings.url.trim_end_matches('/'))).map_err(|err| {
        SyndicationError::Base {
            url: settings.url.clone(),
            source: err,
        }
    })
}

pub(crate) fn absolute_url(base: &Url, path: &str) -> Result<String, SyndicationError> {
    base.join(path.trim_start_matches('/'))
        .map(String::from)
        .map_err(|err| SyndicationError::Link {
            url: path.to_string(),
            source: err,
        })
}

pub(crate) fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn cdata(input: &str) -> String {
    format!("<![CDATA[{}]]>", input.replace("]]>", "]]]]><![CDATA[>"))
}
