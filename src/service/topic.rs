//! This module implements the catalog of newsletter topics.

use anyhow::{bail, Context};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// The maximum number of related topics displayed by default.
pub const RELATED_LIMIT: usize = 3;

/// A newsletter topic.
#[derive(Debug, Deserialize)]
pub struct Topic {
	/// The topic's name, as stored in the database.
	pub name: String,
	/// The emoji used as an icon for the topic.
	pub emoji: String,
	/// Short description of the topic's content.
	pub about: String,

	/// The title displayed on the topic's page. Defaults to the name.
	pub title: Option<String>,
	/// Longer description, for feeds and search engines. Defaults to `about`.
	pub description: Option<String>,
	/// Comma-separated keywords for search engines.
	pub keywords: Option<String>,
	/// Paragraphs of the "about" section of the topic's page.
	#[serde(default)]
	pub overview: Vec<String>,
	/// Names of related topics.
	#[serde(default)]
	pub related: Vec<String>,
}

impl Topic {
	/// Returns the topic's segment in URL paths.
	pub fn path(&self) -> String {
		to_path(&self.name)
	}

	/// Returns the title of the topic.
	pub fn title(&self) -> &str {
		self.title.as_deref().unwrap_or(&self.name)
	}

	/// Returns the long description of the topic.
	pub fn description(&self) -> &str {
		self.description.as_deref().unwrap_or(&self.about)
	}

	/// Returns the keywords of the topic, or `default` if none is defined.
	pub fn keywords<'s>(&'s self, default: &'s str) -> &'s str {
		self.keywords.as_deref().unwrap_or(default)
	}
}

/// Turns a topic name into a URL path segment.
pub fn to_path(name: &str) -> String {
	name.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Turns a URL path segment back into a topic name.
pub fn from_path(path: &str) -> String {
	path.replace('-', " ")
}

#[derive(Deserialize)]
struct CatalogFile {
	#[serde(default)]
	topic: Vec<Topic>,
}

/// The catalog of topics, in display order.
///
/// The catalog is loaded once at startup and never modified afterwards.
#[derive(Debug)]
pub struct Catalog {
	topics: Vec<Topic>,
}

impl Catalog {
	/// Parses a catalog from the content of a TOML file.
	pub fn parse(content: &str) -> anyhow::Result<Self> {
		let file: CatalogFile = toml::from_str(content).context("invalid topics catalog")?;
		let mut names = HashSet::new();
		for topic in &file.topic {
			if !names.insert(topic.name.as_str()) {
				bail!("duplicate topic `{}`", topic.name);
			}
		}
		Ok(Self {
			topics: file.topic,
		})
	}

	/// Reads the catalog at the given path.
	pub fn load(path: &Path) -> anyhow::Result<Self> {
		let content = fs::read_to_string(path)
			.with_context(|| format!("cannot read topics catalog `{}`", path.display()))?;
		Self::parse(&content)
	}

	/// Returns an iterator over topics.
	pub fn iter(&self) -> impl Iterator<Item = &Topic> {
		self.topics.iter()
	}

	/// Returns the topic with the given name.
	pub fn get(&self, name: &str) -> Option<&Topic> {
		self.topics.iter().find(|t| t.name == name)
	}

	/// Returns the topic matching the given URL path segment.
	///
	/// Names with spaces are accepted too.
	pub fn from_path(&self, path: &str) -> Option<&Topic> {
		self.get(&from_path(path))
	}

	/// Returns at most `limit` topics related to `topic`.
	///
	/// If the topic has no valid related topics, the function returns the other topics in
	/// catalog order.
	pub fn related(&self, topic: &Topic, limit: usize) -> Vec<&Topic> {
		let related: Vec<_> = topic
			.related
			.iter()
			.filter_map(|name| self.get(name))
			.filter(|t| t.name != topic.name)
			.take(limit)
			.collect();
		if !related.is_empty() {
			return related;
		}
		self.topics
			.iter()
			.filter(|t| t.name != topic.name)
			.take(limit)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CATALOG: &str = r#"
[[topic]]
name = "Generative AI"
emoji = "🧠"
about = "LLMs and agentic AI"
description = "Dev-focused digest on frontier LLMs"
related = ["Machine Learning Engineer", "Unknown"]

[[topic]]
name = "Data Scientist (with R)"
emoji = "📊"
about = "Programming and data science for the R community"
keywords = "rstats, tidyverse"

[[topic]]
name = "Machine Learning Engineer"
emoji = "🤖"
about = "ML models, MLOps and engineering"

[[topic]]
name = "Crypto"
emoji = "Ⲷ"
about = "Web3, DeFi and blockchain news."
"#;

	#[test]
	fn paths() {
		assert_eq!(to_path("Generative AI"), "Generative-AI");
		assert_eq!(to_path("Data Scientist  (with R)"), "Data-Scientist-(with-R)");
		assert_eq!(from_path("Tech-and-startups"), "Tech and startups");
	}

	#[test]
	fn lookup() {
		let catalog = Catalog::parse(CATALOG).unwrap();
		assert_eq!(catalog.iter().count(), 4);
		let topic = catalog.from_path("Data-Scientist-(with-R)").unwrap();
		assert_eq!(topic.name, "Data Scientist (with R)");
		assert_eq!(topic.path(), "Data-Scientist-(with-R)");
		assert!(catalog.from_path("Generative AI").is_some());
		assert!(catalog.from_path("generative-ai").is_none());
		assert!(catalog.get("Quant finance").is_none());
	}

	#[test]
	fn fallbacks() {
		let catalog = Catalog::parse(CATALOG).unwrap();
		let ai = catalog.get("Generative AI").unwrap();
		assert_eq!(ai.title(), "Generative AI");
		assert_eq!(ai.description(), "Dev-focused digest on frontier LLMs");
		assert_eq!(ai.keywords("newsletters"), "newsletters");
		let r = catalog.get("Data Scientist (with R)").unwrap();
		assert_eq!(r.description(), "Programming and data science for the R community");
		assert_eq!(r.keywords("newsletters"), "rstats, tidyverse");
		assert!(r.overview.is_empty());
	}

	#[test]
	fn related_topics() {
		let catalog = Catalog::parse(CATALOG).unwrap();
		let ai = catalog.get("Generative AI").unwrap();
		let related: Vec<_> = catalog.related(ai, RELATED_LIMIT).iter().map(|t| t.name.as_str()).collect();
		assert_eq!(related, vec!["Machine Learning Engineer"]);

		let crypto = catalog.get("Crypto").unwrap();
		let related: Vec<_> = catalog.related(crypto, 2).iter().map(|t| t.name.as_str()).collect();
		assert_eq!(related, vec!["Generative AI", "Data Scientist (with R)"]);
	}

	#[test]
	fn duplicates_are_rejected() {
		let content = r#"
[[topic]]
name = "Crypto"
emoji = "Ⲷ"
about = "a"

[[topic]]
name = "Crypto"
emoji = "Ⲷ"
about = "b"
"#;
		assert!(Catalog::parse(content).is_err());
	}

	#[test]
	fn shipped_catalog_is_valid() {
		let catalog = Catalog::parse(include_str!("../../topics.toml")).unwrap();
		assert!(catalog.get("Generative AI").is_some());
		for topic in catalog.iter() {
			assert_eq!(catalog.from_path(&topic.path()).map(|t| &t.name), Some(&topic.name));
			for name in &topic.related {
				assert!(catalog.get(name).is_some(), "unknown related topic `{name}`");
			}
		}
	}
}
