//! This module implements access to published newsletter issues.

use crate::service::archive::Published;
use crate::util::{FromRow, PgResult};
use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use macros::FromRow;

/// A newsletter issue published for a topic.
#[derive(Clone, Debug, FromRow)]
pub struct NewsletterIssue {
	/// The name of the topic.
	#[from_row(rename = "newsletter")]
	pub topic: String,
	/// The date at which the issue has been published, in UTC.
	#[from_row(rename = "datetime")]
	pub published_at: NaiveDateTime,
	/// The content of the issue in markdown.
	#[from_row(rename = "text")]
	pub content: String,
}

impl Published for NewsletterIssue {
	fn published_at(&self) -> NaiveDateTime {
		self.published_at
	}
}

impl NewsletterIssue {
	/// Returns all the issues of the topic with the given name, newest first.
	pub async fn list_for_topic(db: &tokio_postgres::Client, topic: &str) -> PgResult<Vec<Self>> {
		db.query_raw(
			"SELECT newsletter, datetime, text FROM blaze_newsletter_md
				WHERE newsletter = $1
				ORDER BY datetime DESC",
			[topic],
		)
		.await?
		.map_ok(|row| Self::from_row(&row))
		.try_collect()
		.await
	}
}
