use crate::route::Page;
use crate::service::subscriber::{Action, SubscriberAction, ALL_TOPICS};
use crate::{util, GlobalData};
use actix_web::{get, post, web, HttpResponse, Responder};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

/// Payload of request to subscribe to a topic.
#[derive(Deserialize, Serialize)]
pub struct SignupPayload {
	/// The email of the subscriber.
	#[serde(default)]
	email: Option<String>,
	/// The path or name of the topic.
	#[serde(default)]
	topic: Option<String>,
}

/// Payload of request to unsubscribe from topics.
#[derive(Deserialize, Serialize)]
pub struct UnsubscribePayload {
	/// The email of the subscriber.
	#[serde(default)]
	email: Option<String>,
	/// Paths or names of the topics. `all` stands for every topic.
	#[serde(default)]
	topics: Vec<String>,
}

fn bad_request(msg: &str) -> HttpResponse {
	HttpResponse::BadRequest().json(json!({ "error": msg }))
}

fn internal_error() -> HttpResponse {
	HttpResponse::InternalServerError().json(json!({ "error": "Internal server error" }))
}

/// Returns the trimmed string, if not empty.
fn non_empty(s: Option<String>) -> Option<String> {
	s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

/// Appends the given actions to the subscriptions log.
async fn log_actions(data: &GlobalData, actions: &[SubscriberAction<'_>]) -> Result<(), HttpResponse> {
	let db = data.db.read().await;
	let Some(db) = db.as_ref() else {
		error!("postgres: not connected");
		return Err(internal_error());
	};
	for action in actions {
		action.insert(db).await.map_err(|error| {
			error!(%error, action = %action.action, "postgres: subscriptions log");
			internal_error()
		})?;
	}
	Ok(())
}

#[post("/api/signup")]
pub async fn signup(data: web::Data<GlobalData>, info: web::Json<SignupPayload>) -> HttpResponse {
	let info = info.into_inner();
	let (Some(email), Some(topic)) = (non_empty(info.email), non_empty(info.topic)) else {
		return bad_request("Email and topic are required");
	};
	if !util::validate_email(&email) {
		return bad_request("Invalid email address");
	}
	let Some(topic) = data.catalog.from_path(&topic) else {
		return bad_request("Unknown topic");
	};

	let action = SubscriberAction::new(&email, Action::Subscribe, &topic.name);
	if let Err(response) = log_actions(&data, &[action]).await {
		return response;
	}
	info!(topic = %topic.name, "new subscription");
	HttpResponse::Ok().json(json!({ "message": "Signup successful" }))
}

#[post("/api/unsubscribe")]
pub async fn unsubscribe(
	data: web::Data<GlobalData>,
	info: web::Json<UnsubscribePayload>,
) -> HttpResponse {
	let info = info.into_inner();
	let Some(email) = non_empty(info.email) else {
		return bad_request("Email is required");
	};
	if !util::validate_email(&email) {
		return bad_request("Invalid email address");
	}
	if info.topics.is_empty() {
		return bad_request("At least one topic is required");
	}
	let mut topics = Vec::with_capacity(info.topics.len());
	for topic in &info.topics {
		let topic = topic.trim();
		if topic == ALL_TOPICS {
			topics.push(ALL_TOPICS);
			continue;
		}
		let Some(topic) = data.catalog.from_path(topic) else {
			return bad_request(&format!("Unknown topic `{topic}`"));
		};
		topics.push(topic.name.as_str());
	}
	topics.sort_unstable();
	topics.dedup();

	let actions: Vec<_> = topics
		.iter()
		.map(|topic| SubscriberAction::new(&email, Action::Unsubscribe, topic))
		.collect();
	if let Err(response) = log_actions(&data, &actions).await {
		return response;
	}
	info!(topics = ?topics, "unsubscription");
	HttpResponse::Ok().json(json!({ "message": "Unsubscribe successful" }))
}

#[get("/unsubscribe")]
pub async fn unsubscribe_page(data: web::Data<GlobalData>) -> impl Responder {
	let topics: String = data
		.catalog
		.iter()
		.map(|t| {
			format!(
				"\t\t<li><label><input type=\"checkbox\" name=\"topic\" value=\"{path}\"> {emoji} {title}</label></li>\n",
				path = encode_double_quoted_attribute(&t.path()),
				emoji = t.emoji,
				title = encode_text(t.title()),
			)
		})
		.collect();
	let html = include_str!("../../pages/unsubscribe.html").replace("{topics}", &topics);
	Page {
		title: &format!("Unsubscribe - {}", data.site.name),
		description: &data.site.description,
		keywords: &data.site.keywords,
		path: "/unsubscribe",
	}
	.render(&data, &html)
}

#[cfg(test)]
mod tests {
	use crate::route;
	use crate::test_util;
	use actix_web::http::header::ContentType;
	use actix_web::{test, App};
	use serde_json::{json, Value};

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

	async fn post(uri: &str, payload: Value) -> (u16, Value) {
		let app = app!();
		let req = test::TestRequest::post()
			.uri(uri)
			.set_json(payload)
			.to_request();
		let res = test::call_service(&app, req).await;
		let status = res.status().as_u16();
		(status, test::read_body_json(res).await)
	}

	#[actix_web::test]
	async fn signup_validation() {
		let (status, body) = post("/api/signup", json!({ "topic": "Crypto" })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Email and topic are required");

		let (status, body) = post("/api/signup", json!({ "email": "a@b.co", "topic": "  " })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Email and topic are required");

		let (status, body) =
			post("/api/signup", json!({ "email": "not an email", "topic": "Crypto" })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Invalid email address");

		let (status, body) =
			post("/api/signup", json!({ "email": "a@b.co", "topic": "Gardening" })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Unknown topic");
	}

	#[actix_web::test]
	async fn signup_without_database() {
		let (status, body) = post(
			"/api/signup",
			json!({ "email": "reader@example.com", "topic": "Generative-AI" }),
		)
		.await;
		assert_eq!(status, 500);
		assert_eq!(body["error"], "Internal server error");
	}

	#[actix_web::test]
	async fn malformed_payload() {
		let app = app!();
		let req = test::TestRequest::post()
			.uri("/api/signup")
			.insert_header(ContentType::json())
			.set_payload(r#"{"email": "#)
			.to_request();
		let res = test::call_service(&app, req).await;
		assert_eq!(res.status(), 400);
		let body: Value = test::read_body_json(res).await;
		assert!(body["error"].is_string());
	}

	#[actix_web::test]
	async fn unsubscribe_validation() {
		let (status, body) = post("/api/unsubscribe", json!({ "topics": ["all"] })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Email is required");

		let (status, body) =
			post("/api/unsubscribe", json!({ "email": "a@b.co", "topics": [] })).await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "At least one topic is required");

		let (status, body) = post(
			"/api/unsubscribe",
			json!({ "email": "a@b.co", "topics": ["Crypto", "Gardening"] }),
		)
		.await;
		assert_eq!(status, 400);
		assert_eq!(body["error"], "Unknown topic `Gardening`");
	}

	#[actix_web::test]
	async fn unsubscribe_without_database() {
		let (status, body) = post(
			"/api/unsubscribe",
			json!({ "email": "reader@example.com", "topics": ["all", "Crypto"] }),
		)
		.await;
		assert_eq!(status, 500);
		assert_eq!(body["error"], "Internal server error");
	}

	#[actix_web::test]
	async fn unsubscribe_page() {
		let app = app!();
		let req = test::TestRequest::get().uri("/unsubscribe").to_request();
		let body = test::call_and_read_body(&app, req).await;
		let body = std::str::from_utf8(&body).unwrap();
		assert!(body.contains(r#"value="all""#));
		assert!(body.contains(r#"value="Machine-Learning-Engineer""#));
	}
}
