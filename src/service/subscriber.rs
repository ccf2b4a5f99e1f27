//! This module implements the log of subscriptions.
//!
//! Rows are only ever inserted. The current state of a subscriber is the latest action for a
//! given email and topic.

use crate::util::{now, PgResult};
use chrono::NaiveDateTime;
use std::fmt;

/// Pseudo-topic used to unsubscribe from every newsletter at once.
pub const ALL_TOPICS: &str = "all";

/// The kind of action performed by a subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
	Subscribe,
	Unsubscribe,
}

impl Action {
	/// Returns the value stored in the database.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Subscribe => "subscribe",
			Self::Unsubscribe => "unsubscribe",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// An entry of the subscriptions log.
pub struct SubscriberAction<'s> {
	/// The email of the subscriber.
	pub email: &'s str,
	/// The action performed.
	pub action: Action,
	/// The name of the topic, or [`ALL_TOPICS`].
	pub topic: &'s str,
	/// The date at which the action has been performed.
	pub date: NaiveDateTime,
}

impl<'s> SubscriberAction<'s> {
	/// Creates an action performed now.
	pub fn new(email: &'s str, action: Action, topic: &'s str) -> Self {
		Self {
			email,
			action,
			topic,
			date: now(),
		}
	}

	/// Appends the action to the log.
	pub async fn insert(&self, db: &tokio_postgres::Client) -> PgResult<()> {
		db.execute(
			"INSERT INTO blaze_subscribers (email, action, newsletter, datetime)
				VALUES ($1, $2, $3, $4)",
			&[&self.email, &self.action.as_str(), &self.topic, &self.date],
		)
		.await?;
		Ok(())
	}
}
