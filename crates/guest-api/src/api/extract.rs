//! Request extractors.

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

/// JSON body extractor whose rejections render like every other API error.
///
/// A body that parses but does not fit the target type is reported as a
/// field error (422); unparseable bodies and missing content types keep
/// their 400/415 statuses with a JSON message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use guest_core::{GuestInput, GuestPatch};

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/v1/guests")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_valid_body() {
        let ApiJson(input) = ApiJson::<GuestInput>::from_request(
            json_request(r#"{"firstname": "Ada", "country_id": 3}"#),
            &(),
        )
        .await
        .unwrap();

        assert_eq!(input.firstname.as_deref(), Some("Ada"));
        assert_eq!(input.country_id, Some(3));
    }

    #[tokio::test]
    async fn test_wrong_type_is_field_error() {
        let err = ApiJson::<GuestInput>::from_request(json_request(r#"{"country_id": "abc"}"#), &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.messages("country_id"),
            ["The country_id field has an invalid type."]
        );
    }

    #[tokio::test]
    async fn test_wrong_type_in_patch_is_field_error() {
        let err = ApiJson::<GuestPatch>::from_request(json_request(r#"{"email": 42}"#), &())
            .await
            .unwrap_err();

        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("email"));
    }

    #[tokio::test]
    async fn test_non_object_body_is_body_error() {
        let err = ApiJson::<GuestInput>::from_request(json_request(r#""just text""#), &())
            .await
            .unwrap_err();

        let ApiError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains("body"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let err = ApiJson::<GuestInput>::from_request(json_request("{bad"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "The request body is not valid JSON.");
    }

    #[tokio::test]
    async fn test_missing_content_type() {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/guests")
            .body(Body::from(r#"{"firstname": "Ada"}"#))
            .unwrap();

        let err = ApiJson::<GuestInput>::from_request(request, &())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UnsupportedMediaType));
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}
