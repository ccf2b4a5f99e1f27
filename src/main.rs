mod config;
mod error;
mod route;
mod service;
mod util;

use crate::config::{ArchiveConfig, Config, SiteConfig};
use crate::service::newsletter::NewsletterIssue;
use crate::service::topic::{Catalog, Topic};
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{web, App, HttpServer};
use std::env;
use std::io;
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time;
use tokio_postgres::NoTls;
use tracing::{error, info, warn};

/// The delay between two attempts to connect to the database.
const RECONNECT_DELAY: Duration = Duration::from_secs(10);

/// Structure shared across the server.
pub struct GlobalData {
	/// The connection to the database.
	///
	/// If `None`, the server is not connected, or is reconnecting.
	pub db: RwLock<Option<tokio_postgres::Client>>,

	/// The catalog of newsletter topics.
	pub catalog: Catalog,
	/// Website configuration.
	pub site: SiteConfig,
	/// Archive configuration.
	pub archive: ArchiveConfig,
}

impl GlobalData {
	/// Returns the issues of the given topic, newest first.
	///
	/// If the database cannot be reached, the error is logged and the function returns an empty
	/// list.
	pub async fn list_issues(&self, topic: &Topic) -> Vec<NewsletterIssue> {
		let db = self.db.read().await;
		let Some(db) = db.as_ref() else {
			warn!(topic = %topic.name, "postgres: not connected");
			return vec![];
		};
		NewsletterIssue::list_for_topic(db, &topic.name)
			.await
			.unwrap_or_else(|error| {
				error!(%error, topic = %topic.name, "postgres: list issues");
				vec![]
			})
	}
}

/// Keeps the database connection alive, reconnecting when it closes.
async fn connection_task(data: web::Data<GlobalData>, db_config: String) {
	loop {
		match tokio_postgres::connect(&db_config, NoTls).await {
			Ok((client, connection)) => {
				info!("postgres: connected");
				*data.db.write().await = Some(client);
				// Wait for the connection to close
				if let Err(error) = connection.await {
					error!(%error, "postgres: connection");
				}
				*data.db.write().await = None;
			}
			Err(error) => error!(%error, "postgres: connection"),
		}
		time::sleep(RECONNECT_DELAY).await;
		info!("postgres: attempting to reconnect");
	}
}

#[actix_web::main]
async fn main() -> io::Result<()> {
	// Enable logging
	if env::var_os("RUST_LOG").is_none() {
		env::set_var("RUST_LOG", "info");
	}
	env_logger::init();

	info!("read configuration");

	let config_path = env::var_os("BLAZE_CONFIG")
		.map(PathBuf::from)
		.unwrap_or_else(|| PathBuf::from("config.toml"));
	let config = Config::load(&config_path).unwrap_or_else(|error| {
		error!("{error:#}");
		exit(1);
	});
	let catalog = Catalog::load(&config.topics).unwrap_or_else(|error| {
		error!("{error:#}");
		exit(1);
	});
	info!(topics = catalog.iter().count(), "topics catalog loaded");

	let data = web::Data::new(GlobalData {
		db: RwLock::new(None),

		catalog,
		site: config.site,
		archive: config.archive,
	});

	info!("connect to database");
	// TODO tls
	tokio::spawn(connection_task(data.clone(), config.db));

	info!(port = config.port, "start http server");
	HttpServer::new(move || {
		App::new()
			.configure(route::configure)
			.wrap(ErrorHandlers::new().default_handler(error::error_handler))
			.app_data(data.clone())
			.app_data(route::json_config())
			.wrap(Logger::new("[%t] %a: %r - Response: %s (in %D ms)"))
	})
	.bind(("0.0.0.0", config.port))?
	.run()
	.await
}

#[cfg(test)]
pub mod test_util {
	use super::*;

	/// Returns server data backed by the shipped catalog and no database connection.
	pub fn data() -> web::Data<GlobalData> {
		web::Data::new(GlobalData {
			db: RwLock::new(None),

			catalog: Catalog::parse(include_str!("../topics.toml")).unwrap(),
			site: SiteConfig::default(),
			archive: ArchiveConfig::default(),
		})
	}
}
