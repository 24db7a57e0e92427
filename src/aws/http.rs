//! HTTP utilities for AWS API calls
//!
//! SigV4-signed requests over a shared `reqwest` client, plus decoding of
//! XML response bodies and error documents.

use super::credentials::{mask_credential, Credentials};
use crate::error::ApiError;
use anyhow::anyhow;
use aws_sigv4::http_request::{sign, SignableBody, SignableRequest, SigningSettings};
use aws_sigv4::sign::v4::SigningParams;
use aws_smithy_runtime_api::client::identity::Identity;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::{Duration, SystemTime};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Header REST-JSON services use to carry the error code
const ERROR_TYPE_HEADER: &str = "x-amzn-errortype";

/// Truncate a response body for logging
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// HTTP client wrapper for signed AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: Client,
    credentials: Credentials,
}

impl AwsHttpClient {
    /// Create a new HTTP client
    pub fn new(credentials: Credentials, timeout: Option<Duration>) -> anyhow::Result<Self> {
        tracing::debug!(
            "Creating AWS HTTP client, access_key: {}",
            mask_credential(&credentials.access_key_id)
        );

        let mut builder = Client::builder().user_agent(concat!(
            "cloud-inventory/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    /// Make a signed GET request
    pub async fn get(&self, service: &str, region: &str, url: &str) -> Result<String, ApiError> {
        self.send(service, region, "GET", url).await
    }

    /// Make a signed POST request with an empty body (Query protocol)
    pub async fn post(&self, service: &str, region: &str, url: &str) -> Result<String, ApiError> {
        self.send(service, region, "POST", url).await
    }

    async fn send(
        &self,
        service: &str,
        region: &str,
        method: &str,
        url: &str,
    ) -> Result<String, ApiError> {
        tracing::debug!("{} {} ({} @ {})", method, url, service, region);

        let signed_headers = self.sign(service, region, method, url)?;

        let mut request = match method {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            _ => return Err(anyhow!("Unsupported HTTP method: {}", method).into()),
        };
        for (name, value) in &signed_headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        let error_type = response
            .headers()
            .get(ERROR_TYPE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(url, &e))?;

        if !status.is_success() {
            // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(parse_error_response(
                status.as_u16(),
                error_type.as_deref(),
                &body,
            ));
        }

        Ok(body)
    }

    /// Compute the SigV4 headers for a request with an empty body
    fn sign(
        &self,
        service: &str,
        region: &str,
        method: &str,
        url: &str,
    ) -> anyhow::Result<Vec<(String, String)>> {
        let parsed_url = url::Url::parse(url)?;
        let host = parsed_url
            .host_str()
            .ok_or_else(|| anyhow!("Invalid URL: {}", url))?;
        let host = match parsed_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let path_and_query = match parsed_url.query() {
            Some(query) => format!("{}?{}", parsed_url.path(), query),
            None => parsed_url.path().to_string(),
        };

        // S3 wants the payload hash spelled out; bodiless requests skip hashing
        let is_s3 = service == "s3";
        let mut headers = vec![("host".to_string(), host)];
        if is_s3 {
            headers.push((
                "x-amz-content-sha256".to_string(),
                "UNSIGNED-PAYLOAD".to_string(),
            ));
        }

        let creds = aws_credential_types::Credentials::new(
            &self.credentials.access_key_id,
            &self.credentials.secret_access_key,
            self.credentials.session_token.clone(),
            None,
            "cloud-inventory",
        );
        let identity: Identity = creds.into();

        let signing_params = SigningParams::builder()
            .identity(&identity)
            .region(region)
            .name(service)
            .time(SystemTime::now())
            .settings(SigningSettings::default())
            .build()?
            .into();

        let signable_body = if is_s3 {
            SignableBody::UnsignedPayload
        } else {
            SignableBody::Bytes(&[])
        };

        let signable_request = SignableRequest::new(
            method,
            &path_and_query,
            headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            signable_body,
        )?;

        let (signing_instructions, _signature) =
            sign(signable_request, &signing_params)?.into_parts();

        // host is set by reqwest itself
        let mut signed: Vec<(String, String)> = headers.into_iter().skip(1).collect();
        for (name, value) in signing_instructions.headers() {
            signed.push((name.to_string(), value.to_string()));
        }

        Ok(signed)
    }
}

/// Map a `reqwest` failure to a connectivity error
fn transport_error(url: &str, err: &reqwest::Error) -> ApiError {
    let endpoint = endpoint_of(url);
    if err.is_timeout() {
        ApiError::Timeout { endpoint }
    } else {
        ApiError::Connection {
            endpoint,
            reason: err.to_string(),
        }
    }
}

/// Scheme, host and port of a URL, which is what error messages show
fn endpoint_of(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => format!(
            "{}://{}/",
            parsed.scheme(),
            match parsed.port() {
                Some(port) => format!("{}:{}", parsed.host_str().unwrap_or_default(), port),
                None => parsed.host_str().unwrap_or_default().to_string(),
            }
        ),
        Err(_) => url.to_string(),
    }
}

/// Build an [`ApiError`] from a failed response.
///
/// Query and REST-XML services send `<Error><Code/><Message/></Error>`
/// (possibly nested); REST-JSON services put the code in a header or in
/// `__type` and the text in `message`.
pub fn parse_error_response(status: u16, error_type: Option<&str>, body: &str) -> ApiError {
    let trimmed = body.trim_start();

    let (code, message) = if trimmed.starts_with('<') {
        match xml_to_json(trimmed) {
            Ok(doc) => (
                find_key(&doc, "Code").map(String::from),
                find_key(&doc, "Message").map(String::from),
            ),
            Err(_) => (None, None),
        }
    } else if let Ok(doc) = serde_json::from_str::<Value>(trimmed) {
        let code = doc
            .get("__type")
            .or_else(|| doc.get("code"))
            .or_else(|| doc.get("Code"))
            .and_then(Value::as_str)
            .map(|t| t.rsplit('#').next().unwrap_or(t).to_string());
        let message = doc
            .get("message")
            .or_else(|| doc.get("Message"))
            .and_then(Value::as_str)
            .map(String::from);
        (code, message)
    } else {
        (None, None)
    };

    // x-amzn-ErrorType looks like "AccessDeniedException:http://internal.amazon.com/..."
    let header_code = error_type
        .map(|t| t.split(':').next().unwrap_or(t).trim())
        .filter(|t| !t.is_empty())
        .map(String::from);

    let code = header_code.or(code).unwrap_or_else(|| {
        reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("UnknownError")
            .replace(' ', "")
    });
    let message = message.unwrap_or_else(|| sanitize_for_log(body));

    ApiError::Service {
        code,
        message,
        status,
    }
}

/// Depth-first search for the first string under `key`
fn find_key<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key).and_then(Value::as_str) {
                return Some(found);
            }
            map.values().find_map(|v| find_key(v, key))
        }
        Value::Array(items) => items.iter().find_map(|v| find_key(v, key)),
        _ => None,
    }
}

/// Parse an XML response into a JSON tree.
///
/// Elements become object keys, repeated siblings become arrays, text-only
/// elements become strings and empty elements become null. Attributes and
/// namespaces are dropped.
pub fn xml_to_json(xml: &str) -> Result<Value, ApiError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn insert(map: &mut Map<String, Value>, key: String, value: Value) {
        if let Some(existing) = map.get_mut(&key) {
            match existing {
                Value::Array(arr) => arr.push(value),
                _ => {
                    let old = existing.take();
                    *existing = Value::Array(vec![old, value]);
                }
            }
        } else {
            map.insert(key, value);
        }
    }

    fn parse_element(reader: &mut Reader<&[u8]>) -> Result<Value, ApiError> {
        let mut map: Map<String, Value> = Map::new();
        let mut text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    let child = parse_element(reader)?;
                    insert(&mut map, tag, child);
                }
                Ok(Event::Empty(e)) => {
                    let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                    insert(&mut map, tag, Value::Null);
                }
                Ok(Event::Text(e)) => {
                    let unescaped = e
                        .unescape()
                        .map_err(|err| ApiError::Decode(format!("XML text: {}", err)))?;
                    text.push_str(unescaped.trim());
                }
                Ok(Event::CData(e)) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::End(_)) | Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(err) => return Err(ApiError::Decode(format!("XML: {}", err))),
            }
        }

        if map.is_empty() && !text.is_empty() {
            Ok(Value::String(text))
        } else if map.is_empty() {
            Ok(Value::Null)
        } else {
            Ok(Value::Object(map))
        }
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut root: Map<String, Value> = Map::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                let child = parse_element(&mut reader)?;
                insert(&mut root, tag, child);
            }
            Ok(Event::Empty(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                insert(&mut root, tag, Value::Null);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(ApiError::Decode(format!("XML: {}", err))),
        }
    }

    Ok(Value::Object(root))
}
