//! Rendering of error responses.

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::ServiceResponse;
use actix_web::http::header;
use actix_web::http::header::HeaderValue;
use actix_web::middleware::ErrorHandlerResponse;

/// Replaces the body of error responses with the error page.
///
/// JSON responses are left untouched since they are meant for scripts, not for users.
pub fn error_handler<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
	let pretty_error = res
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|h| h.to_str().ok())
		.map(|s| !s.starts_with("application/json"))
		.unwrap_or(true);
	let response = if pretty_error {
		let status = res.status();
		let html = include_str!("../pages/error.html");
		let html = html.replace("{error.code}", status.as_str());
		let html = html.replace(
			"{error.reason}",
			status.canonical_reason().unwrap_or("Unknown error"),
		);

		let (req, res) = res.into_parts();
		let res = res.map_body(|_, _| EitherBody::Right {
			body: BoxBody::new(html),
		});

		let mut response = ServiceResponse::new(req, res);
		response.response_mut().headers_mut().insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static("text/html; charset=utf-8"),
		);
		response
	} else {
		res.map_body(|_, body| EitherBody::Left {
			body,
		})
	};
	Ok(ErrorHandlerResponse::Response(response))
}
