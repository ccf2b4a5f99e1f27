//! RSS feeds and sitemap.

use crate::service::archive::Published;
use crate::service::newsletter::NewsletterIssue;
use crate::service::topic::Topic;
use crate::util;
use chrono::{NaiveDate, NaiveDateTime};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt;
use std::fmt::{Display, Formatter};

/// Returns the canonical URL of the issue of `topic` published on `date`.
///
/// This URL is also the stable identifier of the issue in feeds.
pub fn issue_url(base_url: &str, topic: &Topic, date: NaiveDate) -> String {
	format!("{base_url}/{}/archive/{}", topic.path(), util::path_date(date))
}

/// Formats a date as specified by RFC 822, as expected in RSS feeds.
pub fn rfc822(date: NaiveDateTime) -> String {
	date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Display an issue as a RSS feed element.
pub struct IssueRss<'a> {
	pub base_url: &'a str,
	pub topic: &'a Topic,
	pub issue: &'a NewsletterIssue,
}

impl<'a> Display for IssueRss<'a> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let date = self.issue.published_on();
		let url = encode_text(&issue_url(self.base_url, self.topic, date)).into_owned();
		let human_date = util::short_date(date);
		let title = encode_text(&format!("{} - {human_date}", self.topic.title())).into_owned();
		let desc = encode_text(&format!(
			"{} - Issue from {human_date}",
			self.topic.description()
		))
		.into_owned();
		// `]]>` cannot appear inside a CDATA section
		let content = util::markdown_to_html(&self.issue.content).replace("]]>", "]]]]><![CDATA[>");
		write!(
			f,
			r#"
		<item>
			<title>{title}</title>
			<link>{url}</link>
			<guid isPermaLink="true">{url}</guid>
			<description>{desc}</description>
			<pubDate>{pub_date}</pubDate>
			<content:encoded><![CDATA[{content}]]></content:encoded>
		</item>"#,
			pub_date = rfc822(self.issue.published_at),
		)
	}
}

/// RSS channel of a topic.
pub struct TopicRss<'a> {
	/// The name of the website.
	pub site_name: &'a str,
	pub base_url: &'a str,
	pub topic: &'a Topic,
	/// Issues to include, newest first.
	pub issues: &'a [NewsletterIssue],
	/// The date at which the feed is generated.
	pub build_date: NaiveDateTime,
}

impl<'a> Display for TopicRss<'a> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let link = encode_double_quoted_attribute(&format!("{}/{}", self.base_url, self.topic.path()))
			.into_owned();
		write!(
			f,
			r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:atom="http://www.w3.org/2005/Atom">
	<channel>
		<title>{title}</title>
		<link>{link}</link>
		<description>{desc}</description>
		<language>en-us</language>
		<lastBuildDate>{build_date}</lastBuildDate>
		<atom:link href="{link}/feed.xml" rel="self" type="application/rss+xml" />"#,
			title = encode_text(&format!("{} - {}", self.site_name, self.topic.title())),
			desc = encode_text(self.topic.description()),
			build_date = rfc822(self.build_date),
		)?;
		for issue in self.issues {
			IssueRss {
				base_url: self.base_url,
				topic: self.topic,
				issue,
			}
			.fmt(f)?;
		}
		write!(f, "\n\t</channel>\n</rss>")
	}
}

/// How often a page of the sitemap is expected to change.
#[derive(Clone, Copy)]
pub enum ChangeFrequency {
	Daily,
	Weekly,
	Never,
}

impl ChangeFrequency {
	fn as_str(&self) -> &'static str {
		match self {
			Self::Daily => "daily",
			Self::Weekly => "weekly",
			Self::Never => "never",
		}
	}
}

/// An entry of the sitemap.
pub struct SitemapEntry {
	/// The absolute URL of the page.
	pub url: String,
	/// The date of the last modification of the page.
	pub last_modified: Option<NaiveDate>,
	pub change_frequency: ChangeFrequency,
	pub priority: f32,
}

impl Display for SitemapEntry {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "\t<url><loc>{}</loc>", encode_text(&self.url))?;
		if let Some(date) = self.last_modified {
			write!(f, "<lastmod>{}</lastmod>", util::path_date(date))?;
		}
		writeln!(
			f,
			"<changefreq>{}</changefreq><priority>{:.1}</priority></url>",
			self.change_frequency.as_str(),
			self.priority
		)
	}
}

/// Display a list of entries as a sitemap document.
pub struct Sitemap<'a>(pub &'a [SitemapEntry]);

impl<'a> Display for Sitemap<'a> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		writeln!(
			f,
			r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#
		)?;
		self.0.iter().try_for_each(|e| e.fmt(f))?;
		write!(f, "</urlset>")
	}
}
