//! sitemap.xml and robots.txt generation.

use time::OffsetDateTime;

use crate::{
    application::syndication::{SyndicationError, absolute_url, site_base, xml_escape},
    config::SiteSettings,
    domain::{dates::format_rfc3339, document::Document},
};

pub const SITEMAP_FILE: &str = "sitemap.xml";
pub const ROBOTS_FILE: &str = "robots.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Site-absolute path such as `/about.html`.
    pub path: String,
    pub lastmod: Option<OffsetDateTime>,
}

impl From<&Document> for SitemapEntry {
    fn from(document: &Document) -> Self {
        Self {
            path: document.meta.url.clone(),
            lastmod: document.meta.date,
        }
    }
}

/// Generate sitemap.xml content. The homepage always comes first.
pub fn sitemap_xml(
    settings: &SiteSettings,
    entries: &[SitemapEntry],
) -> Result<String, SyndicationError> {
    let base = site_base(settings)?;

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    xml.push_str(&format!("  <url><loc>{}</loc></url>\n", xml_escape(base.as_str())));

    for entry in entries {
        if entry.path == "/" || entry.path == "/index.html" {
            continue;
        }
        let loc = xml_escape(&absolute_url(&base, &entry.path)?);
        match entry.lastmod {
            Some(lastmod) => xml.push_str(&format!(
                "  <url><loc>{loc}</loc><lastmod>{}</lastmod></url>\n",
                format_rfc3339(lastmod)
            )),
            None => xml.push_str(&format!("  <url><loc>{loc}</loc></url>\n")),
        }
    }

    xml.push_str("</urlset>\n");
    Ok(xml)
}

/// Generate robots.txt content.
pub fn robots_txt(settings: &SiteSettings) -> Result<String, SyndicationError> {
    let base = site_base(settings)?;
    let sitemap_url = absolute_url(&base, SITEMAP_FILE)?;
    Ok(format!("User-agent: *\nAllow: /\nSitemap: {sitemap_url}\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn settings() -> SiteSettings {
        SiteSettings {
            url: "https://example.com".to_string(),
            ..crate::config::Settings::default().site
        }
    }

    #[test]
    fn entries_are_absolute_with_optional_lastmod() {
        let xml = sitemap_xml(
            &settings(),
            &[
                SitemapEntry {
                    path: "/posts/2016/05/03/hello.html".to_string(),
                    lastmod: Some(datetime!(2016-05-03 0:00 UTC)),
                },
                SitemapEntry {
                    path: "/about.html".to_string(),
                    lastmod: None,
                },
                SitemapEntry {
                    path: "/index.html".to_string(),
                    lastmod: None,
                },
            ],
        )
        .expect("sitemap");

        assert!(xml.contains("<url><loc>https://example.com/</loc></url>"));
        assert!(xml.contains(
            "<loc>https://example.com/posts/2016/05/03/hello.html</loc><lastmod>2016-05-03T00:00:00Z</lastmod>"
        ));
        assert!(xml.contains("<url><loc>https://example.com/about.html</loc></url>"));
        assert_eq!(xml.matches("<url>").count(), 3);
    }

    #[test]
    fn robots_points_at_the_sitemap() {
        let robots = robots_txt(&settings()).expect("robots");
        assert_eq!(
            robots,
            "User-agent: *\nAllow: /\nSitemap: https://example.com/sitemap.xml\n"
        );
    }
}
