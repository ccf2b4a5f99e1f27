//! Date matching and navigation over the archive of a topic.
//!
//! All functions here are pure: they work on issues already fetched from the database and
//! never fail. Comparisons are done on calendar dates in UTC, never on raw timestamps, so
//! that an issue published at any hour of its day matches lookups by date.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use std::collections::{BTreeMap, HashSet};

/// An item with a publication timestamp, interpreted as UTC.
pub trait Published {
	/// Returns the publication timestamp.
	fn published_at(&self) -> NaiveDateTime;

	/// Returns the calendar date of publication.
	fn published_on(&self) -> NaiveDate {
		self.published_at().date()
	}
}

impl Published for NaiveDateTime {
	fn published_at(&self) -> NaiveDateTime {
		*self
	}
}

impl<P: Published> Published for &P {
	fn published_at(&self) -> NaiveDateTime {
		(*self).published_at()
	}
}

/// The weekly publication schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cadence {
	/// The weekday on which issues are published.
	pub weekday: Weekday,
}

impl Default for Cadence {
	fn default() -> Self {
		Self {
			weekday: Weekday::Tue,
		}
	}
}

impl Cadence {
	/// Tells whether the given item has been published on the cadence's weekday.
	pub fn matches<P: Published>(&self, item: &P) -> bool {
		item.published_on().weekday() == self.weekday
	}
}

/// Returns the issue to display for the given requested date.
///
/// If issues have been published on `date`, the latest of them is returned. Otherwise, the
/// function falls back to the latest issue published on the cadence's weekday before `date`.
///
/// The order of `issues` does not matter.
pub fn resolve_by_date<P: Published>(issues: &[P], date: NaiveDate, cadence: Cadence) -> Option<&P> {
	let exact = issues
		.iter()
		.filter(|i| i.published_on() == date)
		.max_by_key(|i| i.published_at());
	exact.or_else(|| {
		issues
			.iter()
			.filter(|i| cadence.matches(*i) && i.published_on() <= date)
			.max_by_key(|i| i.published_at())
	})
}

/// The neighbours of an issue in the archive.
#[derive(Debug)]
pub struct Adjacent<'i, P> {
	/// The issue right before, in publication order.
	pub previous: Option<&'i P>,
	/// The issue right after, in publication order.
	pub next: Option<&'i P>,
}

// Implemented by hand to avoid requiring `P: Clone`
impl<P> Clone for Adjacent<'_, P> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<P> Copy for Adjacent<'_, P> {}

/// Returns the neighbours of the issue published on `date`.
///
/// `issues` must be sorted newest first. If no issue has been published on `date`, both
/// neighbours are `None`.
pub fn find_adjacent<P: Published>(issues: &[P], date: NaiveDate) -> Adjacent<'_, P> {
	let Some(index) = issues.iter().position(|i| i.published_on() == date) else {
		return Adjacent {
			previous: None,
			next: None,
		};
	};
	Adjacent {
		previous: issues.get(index + 1),
		next: index.checked_sub(1).and_then(|i| issues.get(i)),
	}
}

/// Keeps only the latest issue of each calendar date.
///
/// The result is sorted newest first. Issues with the same timestamp keep their relative
/// order, so that the first one wins.
pub fn dedupe_by_date<P: Published>(issues: impl IntoIterator<Item = P>) -> Vec<P> {
	let mut issues: Vec<P> = issues.into_iter().collect();
	issues.sort_by(|a, b| b.published_at().cmp(&a.published_at()));
	let mut seen = HashSet::new();
	issues.retain(|i| seen.insert(i.published_on()));
	issues
}

/// Dates of publication, grouped by year then by month.
pub type ArchiveIndex = BTreeMap<i32, BTreeMap<u32, Vec<NaiveDate>>>;

/// Groups the publication dates of the given issues by year and month.
///
/// Each date appears once. In each month, dates are sorted newest first.
pub fn group_by_year_month<P: Published>(issues: &[P]) -> ArchiveIndex {
	let mut index = ArchiveIndex::new();
	for issue in issues {
		let date = issue.published_on();
		index
			.entry(date.year())
			.or_default()
			.entry(date.month())
			.or_default()
			.push(date);
	}
	for dates in index.values_mut().flat_map(BTreeMap::values_mut) {
		dates.sort_unstable_by(|a, b| b.cmp(a));
		dates.dedup();
	}
	index
}

/// Returns the archive used for navigation: issues published on the cadence's weekday, on or
/// after `since`, one per date, newest first.
pub fn archive_entries<P: Published>(
	issues: impl IntoIterator<Item = P>,
	cadence: Cadence,
	since: NaiveDate,
) -> Vec<P> {
	dedupe_by_date(
		issues
			.into_iter()
			.filter(|i| cadence.matches(i) && i.published_on() >= since),
	)
}

/// Returns the `limit` most recent issues published on the cadence's weekday, one per date.
pub fn recent<P: Published>(
	issues: impl IntoIterator<Item = P>,
	cadence: Cadence,
	limit: usize,
) -> Vec<P> {
	let mut issues = dedupe_by_date(issues.into_iter().filter(|i| cadence.matches(i)));
	issues.truncate(limit);
	issues
}
