use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use validator::{Validate, ValidationErrors};

/// JSON extractor that deserializes, then validates
///
/// Deserialization and validation failures are both rendered as the
/// standard `{"error": {code, message, category}}` body with status 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ValidationJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(ValidationJsonRejection::Json)?;
        value.validate().map_err(ValidationJsonRejection::Invalid)?;
        Ok(ValidatedJson(value))
    }
}

pub enum ValidationJsonRejection {
    Json(JsonRejection),
    Invalid(ValidationErrors),
}

/// First validation message, ordered by field name for stable output
fn first_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(name, _)| *name);
    fields
        .into_iter()
        .flat_map(|(name, errs)| errs.iter().map(move |e| (name, e)))
        .map(|(name, e)| {
            e.message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}", name))
        })
        .next()
        .unwrap_or_else(|| "Invalid request body".to_string())
}

impl IntoResponse for ValidationJsonRejection {
    fn into_response(self) -> Response {
        let (code, message, original) = match &self {
            ValidationJsonRejection::Invalid(errors) => (
                "VALIDATION_INVALID_INPUT",
                first_message(errors),
                errors.to_string(),
            ),
            ValidationJsonRejection::Json(rejection) => {
                let error_message = rejection.body_text();
                if error_message.contains("missing field") {
                    let field = error_message
                        .split("missing field `")
                        .nth(1)
                        .and_then(|s| s.split('`').next())
                        .unwrap_or("unknown");
                    (
                        "VALIDATION_MISSING_FIELD",
                        format!("Missing required field: {}", field),
                        error_message,
                    )
                } else if error_message.contains("Failed to deserialize") {
                    (
                        "VALIDATION_INVALID_INPUT",
                        "Invalid request body: failed to parse JSON".to_string(),
                        error_message,
                    )
                } else {
                    (
                        "VALIDATION_INVALID_JSON",
                        "Invalid request body".to_string(),
                        error_message,
                    )
                }
            }
        };

        tracing::warn!(
            error_code = code,
            error_message = %message,
            original_error = %original,
            "Request validation failed"
        );

        metrics::counter!("errors_total", "category" => "Validation", "code" => code).increment(1);

        let body = Json(json!({
            "detail": message,
            "error": {
                "code": code,
                "message": message,
                "category": "VALIDATION",
            }
        }));

        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
