//! Minimal HTTP handling for the credentials portal.
//!
//! The board side owns sockets; this module only turns request bytes into a
//! [`PortalRequest`] and describes the reply.

use core::fmt::{self, Write};

use heapless::String;

pub const PATH_BYTES: usize = 64;
pub const BODY_BYTES: usize = 256;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
    Other,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PortalRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String<PATH_BYTES>,
    pub body: String<BODY_BYTES>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PortalParseError {
    /// Header terminator or declared body not received yet.
    Incomplete,
    BadRequestLine,
    TooLarge,
    NotUtf8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormError {
    BadEscape,
    TooLong,
}

pub fn parse_request(raw: &[u8]) -> Result<PortalRequest, PortalParseError> {
    let head_end = find_subslice(raw, b"\r\n\r\n").ok_or(PortalParseError::Incomplete)?;
    let head = core::str::from_utf8(&raw[..head_end]).map_err(|_| PortalParseError::NotUtf8)?;

    let mut lines = head.split("\r\n");
    let request_line = lines.next().ok_or(PortalParseError::BadRequestLine)?;
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(PortalParseError::BadRequestLine);
    };
    let method = match method {
        "GET" => Method::Get,
        "POST" => Method::Post,
        _ => Method::Other,
    };
    let path_str = target.split('?').next().unwrap_or(target);
    let path = String::try_from(path_str).map_err(|_| PortalParseError::TooLarge)?;

    let mut content_length = 0usize;
    for line in lines {
        if let Some((name, value)) = line.split_once(':')
            && name.trim().eq_ignore_ascii_case("content-length")
        {
            content_length = value
                .trim()
                .parse()
                .map_err(|_| PortalParseError::BadRequestLine)?;
        }
    }
    if content_length > BODY_BYTES {
        return Err(PortalParseError::TooLarge);
    }

    let body_start = head_end + 4;
    let available = raw.len().saturating_sub(body_start);
    if available < content_length {
        return Err(PortalParseError::Incomplete);
    }
    let body_bytes = &raw[body_start..body_start + content_length];
    let body_str = core::str::from_utf8(body_bytes).map_err(|_| PortalParseError::NotUtf8)?;
    let body = String::try_from(body_str).map_err(|_| PortalParseError::TooLarge)?;

    Ok(PortalRequest { method, path, body })
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Looks up `key` in an urlencoded body and decodes it into `out`.
/// Returns `Ok(false)` when the key is absent.
pub fn form_value<const N: usize>(
    body: &str,
    key: &str,
    out: &mut String<N>,
) -> Result<bool, FormError> {
    out.clear();
    for pair in body.split('&') {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        if name != key {
            continue;
        }
        url_decode(value, out)?;
        return Ok(true);
    }
    Ok(false)
}

fn url_decode<const N: usize>(value: &str, out: &mut String<N>) -> Result<(), FormError> {
    let bytes = value.as_bytes();
    let mut decoded = heapless::Vec::<u8, N>::new();
    let mut idx = 0usize;
    while idx < bytes.len() {
        let byte = match bytes[idx] {
            b'+' => b' ',
            b'%' => {
                let hi = bytes.get(idx + 1).and_then(|b| hex_value(*b));
                let lo = bytes.get(idx + 2).and_then(|b| hex_value(*b));
                let (Some(hi), Some(lo)) = (hi, lo) else {
                    return Err(FormError::BadEscape);
                };
                idx += 2;
                (hi << 4) | lo
            }
            other => other,
        };
        decoded.push(byte).map_err(|_| FormError::TooLong)?;
        idx += 1;
    }

    let text = core::str::from_utf8(&decoded).map_err(|_| FormError::BadEscape)?;
    out.push_str(text).map_err(|_| FormError::TooLong)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    InternalError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::NotFound => 404,
            Self::InternalError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::InternalError => "Internal Server Error",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PortalResponse {
    pub status: Status,
    pub content_type: &'static str,
    pub body: &'static str,
}

impl PortalResponse {
    pub const fn html(status: Status, body: &'static str) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            body,
        }
    }

    pub const fn text(status: Status, body: &'static str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            body,
        }
    }

    pub fn write_head<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type,
            self.body.len()
        )
    }
}

pub const FORM_PAGE: &str = "<!DOCTYPE html><html><head><meta name=\"viewport\" \
content=\"width=device-width,initial-scale=1\"><title>Lifeline WiFi</title></head><body>\
<h2>Lifeline receiver WiFi</h2><form method=\"POST\" action=\"/save\">\
<p>SSID<br><input name=\"ssid\" maxlength=\"32\" required></p>\
<p>Password<br><input name=\"password\" type=\"password\" maxlength=\"64\"></p>\
<p><button type=\"submit\">Save and restart</button></p></form></body></html>";

pub const SAVED_PAGE: &str = "<!DOCTYPE html><html><body><h2>Saved</h2>\
<p>The receiver restarts and joins the network.</p></body></html>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_post_with_body() {
        let raw = b"POST /save HTTP/1.1\r\nHost: 192.168.4.1\r\ncontent-length: 27\r\n\r\nssid=Home&password=s3cr%21t";
        let request = parse_request(raw).unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.path.as_str(), "/save");
        assert_eq!(request.body.as_str(), "ssid=Home&password=s3cr%21t");
    }

    #[test]
    fn waits_for_declared_body() {
        let raw = b"POST /save HTTP/1.1\r\nContent-Length: 40\r\n\r\nssid=Ho";
        assert_eq!(parse_request(raw), Err(PortalParseError::Incomplete));
        assert_eq!(
            parse_request(b"GET / HTTP/1.1\r\n"),
            Err(PortalParseError::Incomplete)
        );
    }

    #[test]
    fn query_string_is_stripped() {
        let request = parse_request(b"GET /?x=1 HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path.as_str(), "/");
        assert_eq!(request.method, Method::Get);
    }

    #[test]
    fn form_values_are_url_decoded() {
        let mut out: String<32> = String::new();
        assert_eq!(form_value("ssid=My+Net%2F2&password=x", "ssid", &mut out), Ok(true));
        assert_eq!(out.as_str(), "My Net/2");
        assert_eq!(form_value("ssid=a", "password", &mut out), Ok(false));
        assert_eq!(form_value("ssid=%G1", "ssid", &mut out), Err(FormError::BadEscape));
    }

    #[test]
    fn head_carries_status_and_length() {
        let response = PortalResponse::text(Status::NotFound, "nope");
        let mut head: String<160> = String::new();
        response.write_head(&mut head).unwrap();
        assert!(head.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(head.contains("Content-Length: 4\r\n"));
        assert!(head.ends_with("\r\n\r\n"));
    }
}
