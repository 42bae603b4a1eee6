use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Longest caller-supplied id echoed back; anything longer is replaced.
const MAX_REQUEST_ID_LEN: usize = 64;

/// Request id, available to handlers as an `Extension`.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Tags every request with an id.
///
/// A usable `x-request-id` from the caller is kept, otherwise a fresh
/// `UUIDv4` is generated. The id is stored as a [`RequestId`] extension and
/// echoed on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = incoming_id(req.headers().get(REQUEST_ID_HEADER))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

fn incoming_id(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_id_is_kept() {
        let header = HeaderValue::from_static("abc-123");
        assert_eq!(incoming_id(Some(&header)), Some("abc-123"));
    }

    #[test]
    fn blank_or_oversized_id_is_replaced() {
        let blank = HeaderValue::from_static("   ");
        assert_eq!(incoming_id(Some(&blank)), None);

        let long = HeaderValue::from_str(&"x".repeat(MAX_REQUEST_ID_LEN + 1)).unwrap();
        assert_eq!(incoming_id(Some(&long)), None);
        assert_eq!(incoming_id(None), None);
    }
}
