// ISAPI wire types
//
// Raw `EventNotificationAlert` documents as the camera sends them inside
// each multipart part. Every element is optional: firmware versions differ
// in which children they emit, and a missing element is not an error.

use std::fmt::Display;
use std::str::FromStr;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// Root element name every alert part must carry.
pub const ALERT_ROOT: &str = "EventNotificationAlert";

/// One event notification from the ISAPI alert stream.
///
/// Unknown children (e.g. `DetectionRegionList`) are skipped. A scalar
/// child that appears twice is a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename = "EventNotificationAlert", rename_all = "camelCase")]
pub struct EventNotificationAlert {
    #[serde(rename = "@version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub port_no: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(rename = "channelID", default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    /// ISO-8601 with numeric offset, e.g. `2024-03-01T10:00:00+08:00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none", skip_serializing_if = "Option::is_none")]
    pub active_post_count: Option<u32>,
    /// `VMD`, `videoloss`, `linedetection`, ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// `active` or `inactive`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}

impl EventNotificationAlert {
    /// Parse one part body.
    ///
    /// Fails if the bytes are not UTF-8, not well-formed XML, the root is not
    /// `EventNotificationAlert`, or a numeric child does not hold a number.
    pub fn from_xml(payload: &[u8]) -> Result<Self, Error> {
        let text = std::str::from_utf8(payload).map_err(|e| Error::Deserialization {
            message: format!("part body is not UTF-8: {e}"),
        })?;

        match root_element(text)? {
            Some(root) if root == ALERT_ROOT => {}
            Some(root) => {
                return Err(Error::Deserialization {
                    message: format!("expected <{ALERT_ROOT}>, found <{root}>"),
                });
            }
            None => {
                return Err(Error::Deserialization {
                    message: "document has no root element".into(),
                });
            }
        }

        Ok(quick_xml::de::from_str(text)?)
    }
}

/// Numeric child where `<portNo/>` or blank text means absent.
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Local name of the first element in `xml`, skipping the prolog.
fn root_element(xml: &str) -> Result<Option<String>, Error> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(start) | Event::Empty(start) => {
                let name = start.local_name();
                return Ok(Some(String::from_utf8_lossy(name.as_ref()).into_owned()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
