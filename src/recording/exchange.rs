//! Recorded request/response exchanges

use std::collections::BTreeMap;

use bytes::Bytes;
use hyper::header::HeaderMap;

/// Header name to first value
pub type Headers = BTreeMap<String, String>;

/// Parameter name to every value it was given
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Extra parameter documented by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Parameter name
    pub name: String,
    /// Free-form type label, e.g. `integer`
    pub type_label: String,
    /// Example value
    pub example: String,
    /// Description, possibly multi-line
    pub description: String,
    /// Whether the parameter is required
    pub required: bool,
}

impl ParamSpec {
    /// Create a parameter spec
    pub fn new(
        name: impl Into<String>,
        type_label: impl Into<String>,
        example: impl Into<String>,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        Self {
            name: name.into(),
            type_label: type_label.into(),
            example: example.into(),
            description: description.into(),
            required,
        }
    }
}

/// Request as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Request URI with matched path segments replaced by `{name}`
    pub effective_uri: String,
    /// HTTP method
    pub method: String,
    /// First value of each header
    pub headers: Headers,
    /// Query parameters, plus path parameters under their blueprint names
    pub query_params: QueryParams,
    /// Request body
    pub body: Bytes,
}

impl RecordedRequest {
    /// `Content-Type` header, if any
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// Response the downstream handler produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedResponse {
    /// HTTP status code
    pub status_code: u16,
    /// First value of each header
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl RecordedResponse {
    /// `Content-Type` header, if any
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        content_type(&self.headers)
    }
}

/// One recorded round trip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// Documentation group
    pub group: String,
    /// Operation title within the group
    pub name: String,
    /// Recorded request
    pub request: RecordedRequest,
    /// Recorded response
    pub response: RecordedResponse,
    /// Blueprint parameter name to the URI segment it matched
    pub path_params: BTreeMap<String, String>,
    /// Extra parameters declared before the request
    pub extra_params: Vec<ParamSpec>,
}

impl Exchange {
    /// Whether the Parameters section has anything to show
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.request.query_params.is_empty() || !self.extra_params.is_empty()
    }
}

/// Collapse a header map to the first value of each header
#[must_use]
pub fn first_values(map: &HeaderMap) -> Headers {
    map.keys()
        .filter_map(|name| {
            map.get(name).map(|value| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
        })
        .collect()
}

/// Parse a raw query string into a multi-valued map
#[must_use]
pub fn parse_query(query: &str) -> QueryParams {
    let mut params = QueryParams::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_default()
            .push(decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let raw = raw.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(raw.as_bytes())).into_owned()
}

fn content_type(headers: &Headers) -> Option<&str> {
    headers
        .get(hyper::header::CONTENT_TYPE.as_str())
        .map(String::as_str)
}
