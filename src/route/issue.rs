use crate::route::topic::related_html;
use crate::route::{find_topic, Page};
use crate::service::archive;
use crate::service::archive::Published;
use crate::service::newsletter::NewsletterIssue;
use crate::service::topic::Topic;
use crate::util;
use crate::util::PathDate;
use crate::GlobalData;
use actix_web::{error, get, web, Either, HttpResponse, Responder};
use chrono::{Datelike, NaiveDate};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::info;

/// Returns a permanent redirection to the canonical page of the issue of `topic` on `date`.
fn redirect(topic: &Topic, date: NaiveDate) -> web::Redirect {
	web::Redirect::to(format!(
		"/{}/archive/{}",
		topic.path(),
		util::path_date(date)
	))
	.permanent()
}

#[get("/{topic}/archive/{date}")]
pub async fn get(
	data: web::Data<GlobalData>,
	path: web::Path<(String, String)>,
) -> actix_web::Result<impl Responder> {
	let (topic_path, date) = path.into_inner();
	let topic = find_topic(&data, &topic_path)?;
	let date = match PathDate::parse(&date) {
		Some(PathDate::Canonical(date)) => date,
		Some(PathDate::Legacy(date)) => return Ok(Either::Left(redirect(topic, date))),
		None => return Err(error::ErrorNotFound("")),
	};
	let issues = data.list_issues(topic).await;
	let Some(page) = issue_page(&data, topic, &issues, date) else {
		info!(topic = %topic.name, %date, "no issue to display");
		return Err(error::ErrorNotFound(""));
	};
	Ok(Either::Right(page))
}

/// Renders the page of the issue of `topic` to display for the requested `date`.
///
/// `issues` are all the issues of the topic. If no issue matches `date`, the function returns
/// `None`.
pub fn issue_page(
	data: &GlobalData,
	topic: &Topic,
	issues: &[NewsletterIssue],
	date: NaiveDate,
) -> Option<HttpResponse> {
	let cadence = data.archive.cadence();
	let issue = archive::resolve_by_date(issues, date, cadence)?;
	let issue_date = issue.published_on();

	let notice = if issue_date != date {
		info!(topic = %issue.topic, requested = %date, resolved = %issue_date, "issue fallback");
		let reason = if date.weekday() == cadence.weekday {
			"No issue was published"
		} else {
			"Issues are not published"
		};
		format!(
			"<p class=\"notice\">{reason} on {}. Showing the issue from {} instead.</p>",
			util::long_date(date),
			util::long_date(issue_date)
		)
	} else {
		String::new()
	};

	let topic_path = encode_double_quoted_attribute(&topic.path()).into_owned();
	let entries = archive::archive_entries(issues, cadence, data.archive.start);
	let adjacent = archive::find_adjacent(&entries, issue_date);
	let mut navigation = String::new();
	if let Some(next) = adjacent.next {
		let next = next.published_on();
		navigation.push_str(&format!(
			"\t<a class=\"next\" href=\"/{topic_path}/archive/{}\">← Newer: {}</a>\n",
			util::path_date(next),
			util::short_date(next)
		));
	}
	if let Some(previous) = adjacent.previous {
		let previous = previous.published_on();
		navigation.push_str(&format!(
			"\t<a class=\"previous\" href=\"/{topic_path}/archive/{}\">Older: {} →</a>\n",
			util::path_date(previous),
			util::short_date(previous)
		));
	}

	let html = include_str!("../../pages/issue.html");
	let html = html.replace("{topic.path}", &topic_path);
	let html = html.replace("{topic.title}", &encode_text(topic.title()));
	let html = html.replace("{topic.emoji}", &topic.emoji);
	let html = html.replace("{issue.date}", &util::long_date(issue_date));
	let html = html.replace("{issue.notice}", &notice);
	let html = html.replace("{navigation}", &navigation);
	let html = html.replace("{related}", &related_html(data, topic));
	// Inserted last so that the issue's content is never substituted
	let html = html.replace("{issue.content}", &util::markdown_to_html(&issue.content));

	let human_date = util::short_date(issue_date);
	let page = Page {
		title: &format!("{} - {human_date}", topic.title()),
		description: &format!(
			"{} digest from {human_date} featuring {}",
			topic.title(),
			topic.about
		),
		keywords: topic.keywords(&data.site.keywords),
		path: &format!("/{}/archive/{}", topic.path(), util::path_date(issue_date)),
	}
	.render(data, &html);
	Some(page)
}

/// Issue URLs from the former layout of the website.
#[get("/archive/{date}/{topic}")]
pub async fn legacy(
	data: web::Data<GlobalData>,
	path: web::Path<(String, String)>,
) -> actix_web::Result<impl Responder> {
	let (date, topic_path) = path.into_inner();
	let topic = find_topic(&data, &topic_path)?;
	let date = PathDate::parse(&date)
		.ok_or_else(|| error::ErrorNotFound(""))?
		.date();
	Ok(redirect(topic, date))
}
