//! Module implementing utilities.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tokio_postgres::Row;

/// Result with PostgreSQL error.
pub type PgResult<T> = Result<T, tokio_postgres::Error>;

/// Canonical format of dates in URL paths.
pub const PATH_DATE_FORMAT: &str = "%Y-%m-%d";
/// Legacy format of dates in URL paths, still accepted for old links.
pub const LEGACY_PATH_DATE_FORMAT: &str = "%d-%m-%Y";

/// An object that can be instanciated from a SQL row.
pub trait FromRow {
	/// Creates an object from the given SQL row.
	///
	/// If the given row is invalid, the function panics.
	fn from_row(row: &Row) -> Self
	where
		Self: Sized;
}

/// Returns the current date time on the UTC timezone.
pub fn now() -> NaiveDateTime {
	Utc::now().naive_utc()
}

lazy_static! {
	/// Email validation regex.
	static ref EMAIL_VALIDATION: Regex = Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$").unwrap();
}

/// Tells whether the given email is valid.
pub fn validate_email(email: &str) -> bool {
	EMAIL_VALIDATION.is_match(email)
}

/// A date read from a URL path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathDate {
	/// The date is in the canonical `yyyy-MM-dd` format.
	Canonical(NaiveDate),
	/// The date is in the legacy `dd-MM-yyyy` format.
	Legacy(NaiveDate),
}

impl PathDate {
	/// Parses a date path segment.
	///
	/// If the segment is not a valid date in one of the accepted formats, the function returns
	/// `None`.
	pub fn parse(s: &str) -> Option<Self> {
		// chrono tolerates padding and signs, which must not reach the parser
		let layout = |dashes: [usize; 2]| {
			s.len() == 10
				&& s.bytes().enumerate().all(|(i, b)| {
					if dashes.contains(&i) {
						b == b'-'
					} else {
						b.is_ascii_digit()
					}
				})
		};
		if layout([4, 7]) {
			NaiveDate::parse_from_str(s, PATH_DATE_FORMAT)
				.ok()
				.map(Self::Canonical)
		} else if layout([2, 5]) {
			NaiveDate::parse_from_str(s, LEGACY_PATH_DATE_FORMAT)
				.ok()
				.map(Self::Legacy)
		} else {
			None
		}
	}

	/// Returns the parsed date.
	pub fn date(&self) -> NaiveDate {
		match self {
			Self::Canonical(d) | Self::Legacy(d) => *d,
		}
	}
}

/// Formats the given date for use in a URL path.
pub fn path_date(date: NaiveDate) -> String {
	date.format(PATH_DATE_FORMAT).to_string()
}

/// Returns the english ordinal suffix for the given day of the month.
fn ordinal_suffix(day: u32) -> &'static str {
	match (day % 10, day % 100) {
		(_, 11..=13) => "th",
		(1, _) => "st",
		(2, _) => "nd",
		(3, _) => "rd",
		_ => "th",
	}
}

/// Formats a date as `Tuesday 8th April, 2025`.
pub fn long_date(date: NaiveDate) -> String {
	format!(
		"{} {}{} {}",
		date.format("%A"),
		date.day(),
		ordinal_suffix(date.day()),
		date.format("%B, %Y")
	)
}

/// Formats a date as `April 8th, 2025`.
pub fn short_date(date: NaiveDate) -> String {
	format!(
		"{} {}{}, {}",
		date.format("%B"),
		date.day(),
		ordinal_suffix(date.day()),
		date.year()
	)
}

/// Converts the given Markdown to sanitized HTML.
pub fn markdown_to_html(md: &str) -> String {
	let options = pulldown_cmark::Options::all();
	let parser = pulldown_cmark::Parser::new_ext(md, options);
	let mut html = String::new();
	pulldown_cmark::html::push_html(&mut html, parser);
	ammonia::clean(&html)
}
