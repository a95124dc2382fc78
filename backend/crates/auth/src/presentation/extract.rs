//! Request Extractors
//!
//! JSON extraction that reports failures in the common error envelope:
//! an unreadable body becomes a 400 validation error and an oversized
//! body a 413, instead of the framework's plain-text rejections.

use axum::Json;
use axum::extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection};
use axum::http::{StatusCode, header};
use serde::de::DeserializeOwned;

use crate::error::AuthError;
use kernel::error::app_error::FieldError;

/// `Json<T>` with envelope-shaped rejections
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(map_rejection(rejection)),
        }
    }
}

// `Option<ApiJson<T>>` for routes whose body is optional (refresh-token,
// account deletion): no content type means no payload; a present JSON body
// still validates normally.
impl<S, T> OptionalFromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if req.headers().get(header::CONTENT_TYPE).is_none() {
            return Ok(None);
        }

        <Self as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}

fn map_rejection(rejection: JsonRejection) -> AuthError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AuthError::PayloadTooLarge;
    }

    AuthError::Validation(vec![FieldError::new("body", rejection.body_text())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, header};
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    fn json_request(body: &str) -> Request {
        HttpRequest::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body() {
        let req = json_request(r#"{"name":"ok"}"#);
        let result = <ApiJson<Payload> as FromRequest<()>>::from_request(req, &()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_syntax_error_is_validation() {
        let req = json_request("{not json");
        let result = <ApiJson<Payload> as FromRequest<()>>::from_request(req, &()).await;
        match result {
            Err(AuthError::Validation(errors)) => {
                assert_eq!(errors[0].field, "body");
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_missing_content_type_is_validation() {
        let req = HttpRequest::builder()
            .method("POST")
            .body(Body::from(r#"{"name":"ok"}"#))
            .unwrap();
        let result = <ApiJson<Payload> as FromRequest<()>>::from_request(req, &()).await;
        assert!(matches!(result, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn test_optional_without_content_type_is_none() {
        let req = HttpRequest::builder()
            .method("POST")
            .body(Body::empty())
            .unwrap();
        let result =
            <ApiJson<Payload> as OptionalFromRequest<()>>::from_request(req, &()).await;
        assert!(matches!(result, Ok(None)));
    }
}
