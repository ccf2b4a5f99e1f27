use crate::route::{find_topic, Page, TopicCard};
use crate::service::archive;
use crate::service::archive::Published;
use crate::service::feed::TopicRss;
use crate::service::newsletter::NewsletterIssue;
use crate::service::topic::{Topic, RELATED_LIMIT};
use crate::util;
use crate::GlobalData;
use actix_web::http::header;
use actix_web::{get, web, HttpResponse, Responder};
use html_escape::{encode_double_quoted_attribute, encode_text};

/// Returns the cards of the topics related to `topic`.
pub fn related_html(data: &GlobalData, topic: &Topic) -> String {
	data.catalog
		.related(topic, RELATED_LIMIT)
		.into_iter()
		.map(|t| TopicCard::new(t).to_string())
		.collect()
}

#[get("/{topic}")]
pub async fn get(
	data: web::Data<GlobalData>,
	path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
	let topic = find_topic(&data, &path)?;
	let issues = data.list_issues(topic).await;
	let latest = issues.first();

	let subtitle = match latest {
		Some(issue) => format!("Latest issue: {}", util::long_date(issue.published_on())),
		None => encode_text(topic.description()).into_owned(),
	};
	let overview: String = if topic.overview.is_empty() {
		format!("\t<p>{}</p>\n", encode_text(&topic.about))
	} else {
		topic
			.overview
			.iter()
			.map(|p| format!("\t<p>{}</p>\n", encode_text(p)))
			.collect()
	};
	let issue = match latest {
		Some(issue) => format!(
			"<h2>Latest issue</h2>\n<p><a href=\"/{path}/archive/{date}\">Permalink</a></p>\n{content}",
			path = encode_double_quoted_attribute(&topic.path()),
			date = util::path_date(issue.published_on()),
			content = util::markdown_to_html(&issue.content),
		),
		None => "<p>No issue has been published yet. Subscribe to receive the first one!</p>".to_owned(),
	};

	let html = include_str!("../../pages/topic.html");
	let html = html.replace("{topic.emoji}", &topic.emoji);
	let html = html.replace("{topic.title}", &encode_text(topic.title()));
	let html = html.replace("{topic.subtitle}", &subtitle);
	let html = html.replace("{topic.name}", &encode_double_quoted_attribute(&topic.name));
	let html = html.replace("{topic.path}", &encode_double_quoted_attribute(&topic.path()));
	let html = html.replace("{topic.overview}", &overview);
	let html = html.replace("{related}", &related_html(&data, topic));
	// Inserted last so that the issue's content is never substituted
	let html = html.replace("{issue}", &issue);

	Ok(Page {
		title: &format!("{} - {}", topic.title(), data.site.name),
		description: topic.description(),
		keywords: topic.keywords(&data.site.keywords),
		path: &format!("/{}", topic.path()),
	}
	.render(&data, &html))
}

#[get("/{topic}/feed.xml")]
pub async fn feed(
	data: web::Data<GlobalData>,
	path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
	let topic = find_topic(&data, &path)?;
	let issues = data.list_issues(topic).await;
	let issues = archive::recent(issues, data.archive.cadence(), data.archive.feed_items);
	let rss = TopicRss {
		site_name: &data.site.name,
		base_url: &data.site.base_url,
		topic,
		issues: &issues,
		build_date: util::now(),
	};
	Ok(HttpResponse::Ok()
		.content_type("application/xml; charset=utf-8")
		.insert_header((
			header::CACHE_CONTROL,
			"public, s-maxage=3600, stale-while-revalidate=7200",
		))
		.body(rss.to_string()))
}

#[get("/{topic}/archive")]
pub async fn archive_index(
	data: web::Data<GlobalData>,
	path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
	let topic = find_topic(&data, &path)?;
	let issues = data.list_issues(topic).await;
	Ok(archive_page(&data, topic, &issues))
}

/// Renders the archive index of `topic`, given all the issues of the topic.
pub fn archive_page(data: &GlobalData, topic: &Topic, issues: &[NewsletterIssue]) -> HttpResponse {
	let topic_path = encode_double_quoted_attribute(&topic.path()).into_owned();
	let issues = archive::archive_entries(issues, data.archive.cadence(), data.archive.start);
	let index = archive::group_by_year_month(&issues);

	let archive: String = if index.is_empty() {
		"<p>No issue has been archived yet.</p>\n".to_owned()
	} else {
		index
			.iter()
			.rev()
			.map(|(year, months)| {
				let months: String = months
					.values()
					.rev()
					.map(|dates| {
						let month = dates
							.first()
							.map(|d| d.format("%B").to_string())
							.unwrap_or_default();
						let links: String = dates
							.iter()
							.map(|d| {
								format!(
									"\t<li><a href=\"/{topic_path}/archive/{}\">{}</a></li>\n",
									util::path_date(*d),
									util::short_date(*d)
								)
							})
							.collect();
						format!("<h3>{month}</h3>\n<ul>\n{links}</ul>\n")
					})
					.collect();
				format!("<h2>{year}</h2>\n{months}")
			})
			.collect()
	};

	let html = include_str!("../../pages/topic_archive.html");
	let html = html.replace("{topic.path}", &topic_path);
	let html = html.replace("{topic.title}", &encode_text(topic.title()));
	let html = html.replace("{topic.emoji}", &topic.emoji);
	let html = html.replace("{archive}", &archive);

	Page {
		title: &format!("{} Archive - {}", topic.title(), data.site.name),
		description: &format!("Past issues of the {} newsletter.", topic.title()),
		keywords: topic.keywords(&data.site.keywords),
		path: &format!("/{}/archive", topic.path()),
	}
	.render(data, &html)
}

#[cfg(test)]
mod tests {
	use super::archive_page;
	use crate::route;
	use crate::service::newsletter::NewsletterIssue;
	use crate::test_util;
	use actix_web::body;
	use actix_web::http::header;
	use actix_web::{test, App};
	use chrono::NaiveDate;

	macro_rules! app {
		() => {
			test::init_service(
				App::new()
					.app_data(test_util::data())
					.app_data(route::json_config())
					.configure(route::configure),
			)
			.await
		};
	}

	#[actix_web::test]
	async fn topic_page_without_issues() {
		let app = app!();
		let req = test::TestRequest::get().uri("/Crypto").to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 200);
		let body = test::read_body(res).await;
		let body = std::str::from_utf8(&body).unwrap();
		assert!(body.contains("No issue has been published yet"));
		assert!(body.contains(r#"data-topic="Crypto""#));
		assert!(body.contains(r#"href="/Crypto/feed.xml""#));
		assert!(body.contains(r#"<link rel="canonical" href="https://blaze.email/Crypto">"#));
		// Related topics
		assert!(body.contains("topic-card"));
	}

	#[actix_web::test]
	async fn topic_path_with_spaces() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/Tech-and-startups")
			.to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 200);
	}

	#[actix_web::test]
	async fn unknown_topic() {
		for uri in ["/Gardening", "/Gardening/archive", "/Gardening/feed.xml"] {
			let app = app!();
			let req = test::TestRequest::get().uri(uri).to_request();
			let res = test::call_service(&app, req).await;
			assert_eq!(res.status(), 404, "{uri}");
		}
	}

	#[actix_web::test]
	async fn feed_without_issues() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/Generative-AI/feed.xml")
			.to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 200);
		assert_eq!(
			res.headers().get(header::CONTENT_TYPE).unwrap(),
			"application/xml; charset=utf-8"
		);
		assert_eq!(
			res.headers().get(header::CACHE_CONTROL).unwrap(),
			"public, s-maxage=3600, stale-while-revalidate=7200"
		);
		let body = test::read_body(res).await;
		let body = std::str::from_utf8(&body).unwrap();
		assert!(body.contains("<channel>"));
		assert!(body.contains("https://blaze.email/Generative-AI"));
		assert!(!body.contains("<item>"));
	}

	#[actix_web::test]
	async fn empty_archive() {
		let app = app!();
		let req = test::TestRequest::get()
			.uri("/Electronics/archive")
			.to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 200);
		let body = test::read_body(res).await;
		let body = std::str::from_utf8(&body).unwrap();
		assert!(body.contains("No issue has been archived yet."));
	}

	fn issue(y: i32, m: u32, d: u32, hour: u32) -> NewsletterIssue {
		NewsletterIssue {
			topic: "Electronics".to_owned(),
			published_at: NaiveDate::from_ymd_opt(y, m, d)
				.unwrap()
				.and_hms_opt(hour, 0, 0)
				.unwrap(),
			content: String::new(),
		}
	}

	#[actix_web::test]
	async fn archive_index() {
		let data = test_util::data();
		let topic = data.catalog.get("Electronics").unwrap();
		let issues = vec![
			issue(2025, 5, 6, 8),
			issue(2025, 4, 8, 18),
			issue(2025, 4, 8, 8),
			// Monday, off cadence
			issue(2025, 4, 7, 8),
			issue(2025, 4, 1, 8),
			// Before the start of the archive
			issue(2025, 3, 25, 8),
		];
		let res = archive_page(&data, topic, &issues);
		assert_eq!(res.status(), 200);
		let body = body::to_bytes(res.into_body()).await.unwrap();
		let page = std::str::from_utf8(&body).unwrap();

		assert_eq!(page.matches("<h2>2025</h2>").count(), 1);
		assert_eq!(page.matches("/Electronics/archive/2025-04-08").count(), 1);
		assert!(!page.contains("2025-04-07"));
		assert!(!page.contains("2025-03-25"));
		assert!(!page.contains("<h3>March</h3>"));
		let may = page.find("<h3>May</h3>").unwrap();
		let april = page.find("<h3>April</h3>").unwrap();
		let newer = page.find(">April 8th, 2025<").unwrap();
		let older = page.find(">April 1st, 2025<").unwrap();
		assert!(may < april && april < newer && newer < older);
		assert!(page.contains(
			r#"<li><a href="/Electronics/archive/2025-05-06">May 6th, 2025</a></li>"#
		));
	}
}
