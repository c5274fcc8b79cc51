//! Dashboard relay payloads.

use core::fmt::{self, Write};

use crate::history::AlertRecord;

/// Body of one dashboard POST, e.g. `{"DID":3,"message_code":0,"RSSI":-71}`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DashboardPush {
    pub did: u16,
    pub message_code: u8,
    pub rssi: i16,
}

impl DashboardPush {
    pub const fn from_record(record: &AlertRecord) -> Self {
        Self {
            did: record.device_id,
            message_code: record.alert_code.index(),
            rssi: record.rssi,
        }
    }

    pub fn write_json<W: Write>(&self, out: &mut W) -> fmt::Result {
        write!(
            out,
            "{{\"DID\":{},\"message_code\":{},\"RSSI\":{}}}",
            self.did, self.message_code, self.rssi
        )
    }

    /// Length of [`Self::write_json`] output, for `Content-Length`.
    pub fn json_len(&self) -> usize {
        let mut counter = LenCounter(0);
        let _ = self.write_json(&mut counter);
        counter.0
    }

    /// Full HTTP/1.1 request: head followed by the JSON body.
    pub fn write_request<W: Write>(&self, host: &str, path: &str, out: &mut W) -> fmt::Result {
        write!(
            out,
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            path,
            host,
            self.json_len()
        )?;
        self.write_json(out)
    }
}

struct LenCounter(usize);

impl Write for LenCounter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0 += s.len();
        Ok(())
    }
}

/// Pulls the status code out of an HTTP response status line.
pub fn response_status(head: &[u8]) -> Option<u16> {
    let line_end = head.iter().position(|b| *b == b'\r').unwrap_or(head.len());
    let line = core::str::from_utf8(&head[..line_end]).ok()?;
    let mut parts = line.split_whitespace();
    if !parts.next()?.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AlertCode;
    use heapless::String;

    #[test]
    fn json_matches_dashboard_field_names() {
        let record = AlertRecord {
            device_id: 3,
            alert_code: AlertCode::EMERGENCY,
            rssi: -71,
            received_at_ms: 0,
        };
        let push = DashboardPush::from_record(&record);
        let mut json: String<64> = String::new();
        push.write_json(&mut json).unwrap();
        assert_eq!(json.as_str(), "{\"DID\":3,\"message_code\":0,\"RSSI\":-71}");
        assert_eq!(push.json_len(), json.len());
    }

    #[test]
    fn request_head_declares_body_length() {
        let push = DashboardPush {
            did: 12,
            message_code: 14,
            rssi: -100,
        };
        let mut request: String<256> = String::new();
        push.write_request("10.0.0.5", "/api/alerts", &mut request)
            .unwrap();
        assert!(request.starts_with("POST /api/alerts HTTP/1.1\r\nHost: 10.0.0.5\r\n"));
        assert!(request.contains("Content-Length: 40\r\n"));
        assert!(request.ends_with("{\"DID\":12,\"message_code\":14,\"RSSI\":-100}"));
    }

    #[test]
    fn status_code_is_read_from_first_line() {
        assert_eq!(response_status(b"HTTP/1.1 201 Created\r\n\r\n"), Some(201));
        assert_eq!(response_status(b"garbage"), None);
    }
}
