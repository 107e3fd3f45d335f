//! Problem-details `instance` stamping
//!
//! Error responses carry their [`ErrorResponse`] body in the response
//! extensions. This middleware re-renders that body with `instance` set to the
//! request path, so handlers never need to know where they were mounted.

use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::utils::ErrorResponse;

pub async fn problem_instance_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    let Some(body) = response.extensions_mut().remove::<ErrorResponse>() else {
        return response;
    };
    let status = response.status();
    let headers = response.headers().clone();

    let mut stamped = (status, Json(body.with_instance(path))).into_response();
    for (name, value) in headers.iter() {
        if name != axum::http::header::CONTENT_LENGTH {
            stamped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    stamped
}
