use crate::service::archive;
use crate::service::archive::Published;
use crate::service::feed;
use crate::service::feed::{ChangeFrequency, Sitemap, SitemapEntry};
use crate::service::topic::Topic;
use crate::GlobalData;
use actix_files::Files;
use actix_web::http::header::ContentType;
use actix_web::{error, get, web, HttpResponse, Responder};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde_json::json;
use std::fmt;
use std::fmt::{Display, Formatter};

pub mod issue;
pub mod newsletter;
pub mod topic;

/// Registers every route of the website.
///
/// Routes with fixed paths are registered first, since `/{topic}` matches any of them.
pub fn configure(cfg: &mut web::ServiceConfig) {
	cfg.service(Files::new("/assets", "./assets"))
		.service(root)
		.service(about)
		.service(privacy)
		.service(archives)
		.service(feeds)
		.service(robots)
		.service(sitemap)
		.service(newsletter::unsubscribe_page)
		.service(newsletter::signup)
		.service(newsletter::unsubscribe)
		.service(issue::legacy)
		.service(topic::feed)
		.service(topic::archive_index)
		.service(issue::get)
		.service(topic::get);
}

/// Returns the configuration of JSON payloads, answering malformed payloads with a JSON error.
pub fn json_config() -> web::JsonConfig {
	web::JsonConfig::default()
		.limit(16 * 1024)
		.error_handler(|err, _| {
			let response = HttpResponse::BadRequest().json(json!({ "error": err.to_string() }));
			error::InternalError::from_response(err, response).into()
		})
}

/// Returns the topic matching the given path segment.
pub fn find_topic<'d>(data: &'d GlobalData, path: &str) -> actix_web::Result<&'d Topic> {
	data.catalog
		.from_path(path)
		.ok_or_else(|| error::ErrorNotFound(""))
}

/// Metadata of a page.
pub struct Page<'a> {
	pub title: &'a str,
	pub description: &'a str,
	pub keywords: &'a str,
	/// The path of the canonical URL of the page.
	pub path: &'a str,
}

impl Page<'_> {
	/// Wraps the given body in the website's layout.
	pub fn render(&self, data: &GlobalData, body: &str) -> HttpResponse {
		let canonical = format!("{}{}", data.site.base_url, self.path);
		let html = include_str!("../../pages/layout.html");
		let html = html.replace("{page.title}", &encode_text(self.title));
		let html = html.replace("{page.description}", &encode_double_quoted_attribute(self.description));
		let html = html.replace("{page.keywords}", &encode_double_quoted_attribute(self.keywords));
		let html = html.replace("{page.canonical}", &encode_double_quoted_attribute(&canonical));
		let html = html.replace("{site.name}", &encode_text(&data.site.name));
		let html = html.replace("{page.body}", body);
		HttpResponse::Ok()
			.content_type(ContentType::html())
			.body(html)
	}
}

/// Display a topic as a card linking to `href`.
pub struct TopicCard<'a> {
	pub topic: &'a Topic,
	pub href: String,
}

impl<'a> TopicCard<'a> {
	/// Card linking to the topic's page.
	pub fn new(topic: &'a Topic) -> Self {
		Self {
			topic,
			href: format!("/{}", topic.path()),
		}
	}
}

impl Display for TopicCard<'_> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		writeln!(
			f,
			r#"<a class="topic-card" href="{href}"><h3>{emoji} {title}</h3><p>{about}</p></a>"#,
			href = encode_double_quoted_attribute(&self.href),
			emoji = self.topic.emoji,
			title = encode_text(self.topic.title()),
			about = encode_text(&self.topic.about),
		)
	}
}

#[get("/")]
pub async fn root(data: web::Data<GlobalData>) -> impl Responder {
	let topics: String = data
		.catalog
		.iter()
		.map(|t| TopicCard::new(t).to_string())
		.collect();
	let html = include_str!("../../pages/index.html");
	let html = html.replace("{site.name}", &encode_text(&data.site.name));
	let html = html.replace("{site.description}", &encode_text(&data.site.description));
	let html = html.replace("{topics}", &topics);
	Page {
		title: &format!("{} - Smart Weekly Digests for Devs and Tech Professionals", data.site.name),
		description: &data.site.description,
		keywords: &data.site.keywords,
		path: "/",
	}
	.render(&data, &html)
}

#[get("/about")]
pub async fn about(data: web::Data<GlobalData>) -> impl Responder {
	Page {
		title: &format!("About - {}", data.site.name),
		description: &data.site.description,
		keywords: &data.site.keywords,
		path: "/about",
	}
	.render(&data, include_str!("../../pages/about.html"))
}

#[get("/privacy")]
pub async fn privacy(data: web::Data<GlobalData>) -> impl Responder {
	Page {
		title: &format!("Privacy Policy - {}", data.site.name),
		description: &data.site.description,
		keywords: &data.site.keywords,
		path: "/privacy",
	}
	.render(&data, include_str!("../../pages/privacy.html"))
}

#[get("/archive")]
pub async fn archives(data: web::Data<GlobalData>) -> impl Responder {
	let topics: String = data
		.catalog
		.iter()
		.map(|topic| {
			TopicCard {
				topic,
				href: format!("/{}/archive", topic.path()),
			}
			.to_string()
		})
		.collect();
	let html = include_str!("../../pages/archives.html").replace("{topics}", &topics);
	Page {
		title: &format!("Newsletter Archives - {}", data.site.name),
		description: "Browse our archive of past newsletters covering various topics in tech, AI, and more.",
		keywords: &data.site.keywords,
		path: "/archive",
	}
	.render(&data, &html)
}

#[get("/feeds")]
pub async fn feeds(data: web::Data<GlobalData>) -> impl Responder {
	let feeds: String = data
		.catalog
		.iter()
		.map(|t| {
			format!(
				"\t<li>{emoji} <a href=\"/{path}/feed.xml\">{title}</a> - {about}</li>\n",
				emoji = t.emoji,
				path = encode_double_quoted_attribute(&t.path()),
				title = encode_text(t.title()),
				about = encode_text(&t.about),
			)
		})
		.collect();
	let html = include_str!("../../pages/feeds.html").replace("{feeds}", &feeds);
	Page {
		title: &format!("RSS Feeds - {}", data.site.name),
		description: &data.site.description,
		keywords: &data.site.keywords,
		path: "/feeds",
	}
	.render(&data, &html)
}

#[get("/robots.txt")]
pub async fn robots(data: web::Data<GlobalData>) -> impl Responder {
	format!(
		"User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml",
		data.site.base_url
	)
}

#[get("/sitemap.xml")]
pub async fn sitemap(data: web::Data<GlobalData>) -> impl Responder {
	let base_url = &data.site.base_url;
	let mut entries = vec![SitemapEntry {
		url: base_url.clone(),
		last_modified: None,
		change_frequency: ChangeFrequency::Daily,
		priority: 1.0,
	}];
	for topic in data.catalog.iter() {
		let issues = data.list_issues(topic).await;
		let issues = archive::archive_entries(&issues, data.archive.cadence(), data.archive.start);
		entries.push(SitemapEntry {
			url: format!("{base_url}/{}", topic.path()),
			last_modified: issues.first().map(|i| i.published_on()),
			change_frequency: ChangeFrequency::Weekly,
			priority: 0.9,
		});
		entries.extend(issues.iter().map(|i| SitemapEntry {
			url: feed::issue_url(base_url, topic, i.published_on()),
			last_modified: Some(i.published_on()),
			change_frequency: ChangeFrequency::Never,
			priority: 0.7,
		}));
	}
	HttpResponse::Ok()
		.content_type(ContentType::xml())
		.body(Sitemap(&entries).to_string())
}

#[cfg(test)]
mod tests {
	use super::TopicCard;
	use crate::service::topic::Catalog;
	use crate::test_util;
	use actix_web::http::header;
	use actix_web::{test, App};

	macro_rules! app {
		() => {
			test::init_service(
				App::new()
					.app_data(test_util::data())
					.app_data(super::json_config())
					.configure(super::configure),
			)
			.await
		};
	}

	async fn get_body(uri: &str) -> String {
		let app = app!();
		let req = test::TestRequest::get().uri(uri).to_request();
		let body = test::call_and_read_body(&app, req).await;
		String::from_utf8(body.to_vec()).unwrap()
	}

	#[actix_web::test]
	async fn root_lists_topics() {
		let body = get_body("/").await;
		assert!(body.contains(r#"href="/Generative-AI""#));
		assert!(body.contains(r#"href="/Data-Scientist-(with-R)""#));
		assert!(body.contains("<title>Blaze Newsletters - "));
		assert!(body.contains(r#"<link rel="canonical" href="https://blaze.email/">"#));
	}

	#[actix_web::test]
	async fn static_pages() {
		for uri in ["/about", "/privacy", "/archive", "/feeds"] {
			let app = app!();
			let req = test::TestRequest::get().uri(uri).to_request();
			let res = test::call_service(&app, req).await;
			assert_eq!(res.status(), 200, "{uri}");
		}
		let body = get_body("/feeds").await;
		assert!(body.contains(r#"href="/Crypto/feed.xml""#));
		let body = get_body("/archive").await;
		assert!(body.contains(r#"href="/Crypto/archive""#));
	}

	#[actix_web::test]
	async fn robots() {
		let body = get_body("/robots.txt").await;
		assert!(body.contains("Allow: /"));
		assert!(body.contains("Sitemap: https://blaze.email/sitemap.xml"));
	}

	#[actix_web::test]
	async fn sitemap_without_database() {
		let app = app!();
		let req = test::TestRequest::get().uri("/sitemap.xml").to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 200);
		let content_type = res.headers().get(header::CONTENT_TYPE).unwrap();
		assert!(content_type.to_str().unwrap().contains("xml"));
		let body = test::read_body(res).await;
		let body = std::str::from_utf8(&body).unwrap();
		assert!(body.contains("<loc>https://blaze.email</loc>"));
		assert!(body.contains("<loc>https://blaze.email/Electronics</loc>"));
		assert!(!body.contains("/archive/"));
	}

	#[::core::prelude::v1::test]
	fn escaping() {
		let catalog = Catalog::parse(
			r#"
[[topic]]
name = "Q&A \"Live\""
emoji = "🎙"
about = "R & <Python> \"tips\" 'n' tricks"
"#,
		)
		.unwrap();
		let topic = catalog.iter().next().unwrap();
		let card = TopicCard::new(topic).to_string();
		assert!(card.contains(r#"href="/Q&amp;A-&quot;Live&quot;""#));
		assert!(card.contains(r#"<h3>🎙 Q&amp;A "Live"</h3>"#));
		assert!(card.contains(r#"<p>R &amp; &lt;Python&gt; "tips" 'n' tricks</p>"#));
	}
}
