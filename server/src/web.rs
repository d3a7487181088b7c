use std::sync::Arc;
use std::thread;

use http::header::{self, HeaderName};
use http::{Request, StatusCode, Uri};
use log::{debug, error, info, warn};
use serde::Serialize;
use serde_json::json;
use simple_server::Server;

use crate::error::{Error, Result};
use crate::types::{ParameterUpdate, ReadingSubmission};
use crate::Services;

const ALLOWED_METHODS: &str = "GET,POST,OPTIONS";

/// Everything needed to write a response, independent of the server library
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<(HeaderName, String)>,
    pub body: String,
}

impl Reply {
    fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Self> {
        Ok(Reply {
            status,
            headers: vec![(header::CONTENT_TYPE, "application/json".into())],
            body: serde_json::to_string(value)?,
        })
    }

    fn error(status: StatusCode, message: &str) -> Self {
        Reply {
            status,
            headers: vec![(header::CONTENT_TYPE, "application/json".into())],
            body: json!({ "error": message }).to_string(),
        }
    }

    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

pub fn run_server(
    listen_address: String,
    port: u16,
    services: Arc<Services>,
) -> thread::JoinHandle<()> {
    let server = Server::new(move |request, mut response| {
        let Reply {
            status,
            headers,
            body,
        } = handle_request(&request, &services);

        response.status(status.as_u16());
        for (name, value) in headers {
            response.header(name, value.as_str());
        }
        Ok(response.body(body.into_bytes())?)
    });

    thread::spawn(move || {
        info!("Starting http server: http://{}:{}", listen_address, port);
        server.listen(&listen_address, &format!("{}", port));
    })
}

/// Routes one request and always produces a response. Every response allows
/// any origin.
pub fn handle_request(request: &Request<Vec<u8>>, services: &Services) -> Reply {
    debug!("{} {}", request.method(), request.uri());

    let mut reply = match route(request, services) {
        Ok(reply) => reply,
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("Failed to handle {}: {}", request.uri(), e);
            } else {
                warn!("Rejected {} {}: {}", request.method(), request.uri(), e);
            }
            Reply::error(status, &e.to_string())
        }
    };

    reply
        .headers
        .push((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".into()));
    reply
}

fn route(request: &Request<Vec<u8>>, services: &Services) -> Result<Reply> {
    let path = request.uri().path().trim_end_matches('/');
    let path_parts = path.split('/').skip(1).collect::<Vec<_>>();

    match (request.method().as_str(), path_parts.as_slice()) {
        ("OPTIONS", _) => Ok(preflight(request)),
        ("POST", ["api", "waterLevel"]) => {
            let submission: ReadingSubmission = parse_body(request.body())?;
            services.ingestion.submit(&submission)?;
            Reply::json(StatusCode::OK, &json!({ "status": "success" }))
        }
        ("GET", ["api", "waterLevel"]) => {
            let limit = limit_param(request.uri());
            Reply::json(StatusCode::OK, &services.query.window(limit))
        }
        ("GET", ["api", "waterLevel", "current"]) => {
            Reply::json(StatusCode::OK, &services.query.current())
        }
        ("GET", ["api", "params"]) => {
            Reply::json(StatusCode::OK, &services.parameters.get())
        }
        ("POST", ["api", "params"]) => {
            let update: ParameterUpdate = parse_body(request.body())?;
            let parameters = services.parameters.set(&update)?;
            if update.is_empty() {
                debug!("Parameter update without fields, returning {:?}", parameters);
            } else {
                info!("Updated PID parameters: {:?}", parameters);
            }
            Reply::json(StatusCode::OK, &parameters)
        }
        _ => Err(Error::UnhandledUri(format!("{} {}", request.method(), path))),
    }
}

fn preflight(request: &Request<Vec<u8>>) -> Reply {
    let allowed_headers = request
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("Content-Type")
        .to_string();

    Reply {
        status: StatusCode::NO_CONTENT,
        headers: vec![
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS.into()),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, allowed_headers),
        ],
        body: String::new(),
    }
}

/// An empty body counts as an empty JSON object
fn parse_body<T>(body: &[u8]) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(Error::MalformedBody)
}

/// `limit` from the query string. Anything that is not a non-negative integer
/// is ignored, which selects the whole window.
fn limit_param(uri: &Uri) -> Option<usize> {
    uri.query()?
        .split('&')
        .filter_map(|pair| {
            let mut key_value = pair.splitn(2, '=');
            match (key_value.next(), key_value.next()) {
                (Some("limit"), Some(value)) => Some(value),
                _ => None,
            }
        })
        .next()?
        .trim()
        .parse::<usize>()
        .ok()
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::UnhandledUri(_) => StatusCode::NOT_FOUND,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
