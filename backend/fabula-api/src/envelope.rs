/// Response envelope
///
/// Every success response is `{status, msg, data}`. Error responses use the
/// same shape with `data: null`, built in `error::AppError::error_response`.
use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: u16,
    pub msg: String,
    pub data: Option<T>,
}

pub fn respond<T: Serialize>(status: StatusCode, msg: &str, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        status: status.as_u16(),
        msg: msg.to_string(),
        data: Some(data),
    })
}

/// 200 with payload
pub fn ok<T: Serialize>(msg: &str, data: T) -> HttpResponse {
    respond(StatusCode::OK, msg, data)
}

/// 201 with payload
pub fn created<T: Serialize>(msg: &str, data: T) -> HttpResponse {
    respond(StatusCode::CREATED, msg, data)
}

/// 200 with `data: null`
pub fn ok_empty(msg: &str) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::<()> {
        status: StatusCode::OK.as_u16(),
        msg: msg.to_string(),
        data: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let env = Envelope {
            status: 200,
            msg: "ok".to_string(),
            data: Some(serde_json::json!({"id": 1})),
        };
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["msg"], "ok");
        assert_eq!(value["data"]["id"], 1);
    }

    #[test]
    fn test_empty_envelope_serializes_null_data() {
        let env = Envelope::<()> {
            status: 200,
            msg: "done".to_string(),
            data: None,
        };
        let value = serde_json::to_value(&env).unwrap();
        assert!(value["data"].is_null());
    }
}
