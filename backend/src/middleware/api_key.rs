use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};

/// Header the client sends its API key in.
pub const API_KEY_HEADER: &str = "authorization-id";

/// Client API key lifted from the request headers.
///
/// Present in the request extensions only when the header was sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey(pub String);

/// Copy the `Authorization-Id` header, verbatim, into an [`ApiKey`] extension.
pub fn relay_api_key<B>(request: &mut axum::http::Request<B>) {
    let Some(value) = request.headers().get(API_KEY_HEADER) else {
        return;
    };
    let key = String::from_utf8_lossy(value.as_bytes()).into_owned();
    request.extensions_mut().insert(ApiKey(key));
}

/// Middleware form of [`relay_api_key`].
pub async fn api_key_relay(mut request: Request, next: Next) -> Response {
    relay_api_key(&mut request);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn test_header_missing() {
        let mut request = Request::get("/does/not/matter").body(Body::empty()).unwrap();
        relay_api_key(&mut request);
        assert!(request.extensions().get::<ApiKey>().is_none());
    }

    #[test]
    fn test_header_transfers() {
        let mut request = Request::get("/does/not/matter")
            .header("Authorization-Id", "testapikey")
            .body(Body::empty())
            .unwrap();
        relay_api_key(&mut request);
        assert_eq!(
            request.extensions().get::<ApiKey>(),
            Some(&ApiKey("testapikey".to_string()))
        );
    }

    #[test]
    fn test_empty_header_is_kept() {
        let mut request = Request::get("/")
            .header("Authorization-Id", "")
            .body(Body::empty())
            .unwrap();
        relay_api_key(&mut request);
        assert_eq!(request.extensions().get::<ApiKey>(), Some(&ApiKey(String::new())));
    }

    #[test]
    fn test_value_not_trimmed() {
        let mut request = Request::get("/")
            .header("Authorization-Id", "key with\tinner space")
            .body(Body::empty())
            .unwrap();
        relay_api_key(&mut request);
        assert_eq!(
            request.extensions().get::<ApiKey>().map(|k| k.0.as_str()),
            Some("key with\tinner space")
        );
    }
}
