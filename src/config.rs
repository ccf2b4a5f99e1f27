use crate::service::archive::Cadence;
use anyhow::Context;
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Website configuration.
#[derive(Debug, Deserialize)]
pub struct SiteConfig {
	/// The name of the website.
	#[serde(default = "SiteConfig::default_name")]
	pub name: String,
	/// The description of the website.
	#[serde(default = "SiteConfig::default_description")]
	pub description: String,
	/// The URL at which the website is reachable, without trailing slash.
	#[serde(default = "SiteConfig::default_base_url")]
	pub base_url: String,
	/// Keywords used for pages whose topic has none.
	#[serde(default = "SiteConfig::default_keywords")]
	pub keywords: String,
}

impl SiteConfig {
	fn default_name() -> String {
		"Blaze Newsletters".to_owned()
	}

	fn default_description() -> String {
		"Subscribe to our free weekly tech newsletters covering AI, data science, machine learning, crypto, tech startups, and electronics.".to_owned()
	}

	fn default_base_url() -> String {
		"https://blaze.email".to_owned()
	}

	fn default_keywords() -> String {
		"tech newsletters, AI newsletter, data science newsletter, machine learning newsletter, weekly tech updates, free tech newsletter".to_owned()
	}
}

impl Default for SiteConfig {
	fn default() -> Self {
		Self {
			name: Self::default_name(),
			description: Self::default_description(),
			base_url: Self::default_base_url(),
			keywords: Self::default_keywords(),
		}
	}
}

/// Archive configuration.
#[derive(Debug, Deserialize)]
pub struct ArchiveConfig {
	/// The weekday on which issues are published.
	#[serde(default = "ArchiveConfig::default_weekday")]
	pub weekday: Weekday,
	/// Issues published before this date are not part of the browsable archive.
	#[serde(default = "ArchiveConfig::default_start")]
	pub start: NaiveDate,
	/// The number of issues in RSS feeds.
	#[serde(default = "ArchiveConfig::default_feed_items")]
	pub feed_items: usize,
}

impl ArchiveConfig {
	fn default_weekday() -> Weekday {
		Cadence::default().weekday
	}

	/// Returns the publication schedule.
	pub fn cadence(&self) -> Cadence {
		Cadence {
			weekday: self.weekday,
		}
	}

	fn default_start() -> NaiveDate {
		NaiveDate::from_ymd_opt(2025, 4, 1).unwrap_or_default()
	}

	fn default_feed_items() -> usize {
		10
	}
}

impl Default for ArchiveConfig {
	fn default() -> Self {
		Self {
			weekday: Self::default_weekday(),
			start: Self::default_start(),
			feed_items: Self::default_feed_items(),
		}
	}
}

/// Server configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
	/// The HTTP server's port.
	pub port: u16,
	/// The connection string for the database.
	pub db: String,
	/// The path to the topics catalog.
	#[serde(default = "Config::default_topics")]
	pub topics: PathBuf,

	#[serde(default)]
	pub site: SiteConfig,
	#[serde(default)]
	pub archive: ArchiveConfig,
}

impl Config {
	fn default_topics() -> PathBuf {
		PathBuf::from("topics.toml")
	}

	/// Reads the configuration file at the given path.
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("cannot read configuration file `{}`", path.display()))?;
		let mut config: Self = toml::from_str(&content).context("invalid configuration file")?;
		let base_url = config.site.base_url.trim_end_matches('/').len();
		config.site.base_url.truncate(base_url);
		Ok(config)
	}
}
