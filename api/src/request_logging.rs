use poem::http::{HeaderValue, StatusCode};
use poem::{Endpoint, IntoResponse, Middleware, Request, Response};
use std::time::Instant;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Logs every request once it finishes and echoes a request id on the response.
///
/// A well-formed `x-request-id` from the client (or a proxy) is reused,
/// otherwise a fresh one is generated.
pub struct RequestLogging;

impl<E: Endpoint> Middleware<E> for RequestLogging {
    type Output = RequestLoggingEndpoint<E>;

    fn transform(&self, ep: E) -> Self::Output {
        RequestLoggingEndpoint { inner: ep }
    }
}

pub struct RequestLoggingEndpoint<E> {
    inner: E,
}

impl<E: Endpoint> Endpoint for RequestLoggingEndpoint<E> {
    type Output = Response;

    async fn call(&self, req: Request) -> poem::Result<Self::Output> {
        let start = Instant::now();
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| is_valid_request_id(value))
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let has_search = req.uri().query().is_some_and(has_search_param);
        let client_ip = req
            .remote_addr()
            .as_socket_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let result = self.inner.call(req).await;
        let duration_ms = start.elapsed().as_millis();

        let mut resp = match result {
            Ok(resp) => resp.into_response(),
            Err(err) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    status = err.status().as_u16(),
                    duration_ms = %duration_ms,
                    client_ip = %client_ip,
                    error = %err,
                    "request error"
                );
                return Err(err);
            }
        };

        let status = resp.status().as_u16();
        match classify(resp.status()) {
            Outcome::Success => tracing::info!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                duration_ms = %duration_ms,
                has_search,
                client_ip = %client_ip,
                "request completed"
            ),
            Outcome::Failure => tracing::warn!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                duration_ms = %duration_ms,
                has_search,
                client_ip = %client_ip,
                "request failed"
            ),
            Outcome::Other => tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status,
                duration_ms = %duration_ms,
                client_ip = %client_ip,
                "request completed"
            ),
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            resp.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        Ok(resp)
    }
}

#[derive(Debug, PartialEq)]
enum Outcome {
    Success,
    Failure,
    Other,
}

fn classify(status: StatusCode) -> Outcome {
    if status.is_success() {
        Outcome::Success
    } else if status.is_client_error() || status.is_server_error() {
        Outcome::Failure
    } else {
        Outcome::Other
    }
}

fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn has_search_param(query: &str) -> bool {
    query
        .split('&')
        .any(|pair| pair == "search" || pair.starts_with("search="))
}
