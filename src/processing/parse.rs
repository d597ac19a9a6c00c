//! TCX decoding: raw bytes or text into an [`ActivityTrace`].
//!
//! Two entry points exist because uploads reach us in two shapes. Desktop
//! browsers hand over the file bytes, which may carry a BOM and must be valid
//! in the declared encoding. Some mobile browsers hand over text that was
//! already decoded (sometimes imperfectly), which is parsed as-is.

use crate::processing::types::{ActivityTrace, TCX_NAMESPACE, TcxError, Trackpoint};
use chrono::{DateTime, NaiveDateTime, Utc};
use roxmltree::{Document, Node};
use std::borrow::Cow;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_LE_BOM: &[u8] = &[0xFF, 0xFE];
const UTF16_BE_BOM: &[u8] = &[0xFE, 0xFF];

/// Parse a TCX file from its raw bytes.
pub fn parse_trace_bytes(bytes: &[u8]) -> Result<ActivityTrace, TcxError> {
    let text = decode_tcx_bytes(bytes)?;
    parse_trace_text(&text)
}

/// Parse a TCX document that has already been decoded to text.
pub fn parse_trace_text(text: &str) -> Result<ActivityTrace, TcxError> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let document = Document::parse(text).map_err(|err| TcxError::Xml(err.to_string()))?;
    let root = document.root_element();

    let trackpoints: Vec<Trackpoint> = root
        .descendants()
        .filter(|node| *node != root && is_tcx_element(node, "Trackpoint"))
        .map(read_trackpoint)
        .collect();

    if trackpoints.is_empty() {
        return Err(TcxError::NoTrackpoints);
    }

    Ok(ActivityTrace { trackpoints })
}

/// Strictly decode file bytes, honoring a UTF-8 or UTF-16 byte order mark.
pub fn decode_tcx_bytes(bytes: &[u8]) -> Result<Cow<'_, str>, TcxError> {
    if let Some(rest) = bytes.strip_prefix(UTF8_BOM) {
        return decode_utf8_strict(rest).map(Cow::Borrowed);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_LE_BOM) {
        return decode_utf16(rest, u16::from_le_bytes).map(Cow::Owned);
    }
    if let Some(rest) = bytes.strip_prefix(UTF16_BE_BOM) {
        return decode_utf16(rest, u16::from_be_bytes).map(Cow::Owned);
    }
    decode_utf8_strict(bytes).map(Cow::Borrowed)
}

/// Decode bytes as UTF-8, silently dropping any invalid sequences.
pub fn decode_utf8_ignoring_invalid(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

fn decode_utf8_strict(bytes: &[u8]) -> Result<&str, TcxError> {
    std::str::from_utf8(bytes).map_err(|err| TcxError::Decode(err.to_string()))
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, TcxError> {
    if bytes.len() % 2 != 0 {
        return Err(TcxError::Decode("odd number of bytes in UTF-16 input".into()));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|err| TcxError::Decode(err.to_string()))
}

fn is_tcx_element(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node.tag_name().namespace() == Some(TCX_NAMESPACE)
}

fn tcx_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| is_tcx_element(child, name))
}

fn child_text<'a>(node: Node<'a, '_>, path: &[&str]) -> Option<&'a str> {
    let mut current = node;
    for name in path {
        current = tcx_child(current, name)?;
    }
    current.text().filter(|text| !text.is_empty())
}

fn read_trackpoint(node: Node<'_, '_>) -> Trackpoint {
    Trackpoint {
        time: child_text(node, &["Time"]).and_then(parse_timestamp),
        heart_rate: child_text(node, &["HeartRateBpm", "Value"]).and_then(parse_number),
        cadence: child_text(node, &["Cadence"]).and_then(parse_number),
        altitude_m: child_text(node, &["AltitudeMeters"]).and_then(parse_number),
        distance_m: child_text(node, &["DistanceMeters"]).and_then(parse_number),
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// RFC 3339 timestamps (`Z` or an explicit offset); a bare local timestamp is
/// read as UTC.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(trackpoints: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<TrainingCenterDatabase xmlns="{TCX_NAMESPACE}">
  <Activities><Activity Sport="Running"><Lap><Track>{trackpoints}</Track></Lap></Activity></Activities>
</TrainingCenterDatabase>"#
        )
    }

    #[test]
    fn reads_all_fields_of_a_trackpoint() {
        let xml = document(
            "<Trackpoint><Time>2024-05-01T07:00:00Z</Time><AltitudeMeters>12.5</AltitudeMeters>\
             <DistanceMeters>3.2</DistanceMeters><HeartRateBpm><Value>121</Value></HeartRateBpm>\
             <Cadence>80</Cadence></Trackpoint>",
        );
        let trace = parse_trace_text(&xml).unwrap();

        assert_eq!(trace.trackpoints.len(), 1);
        let point = &trace.trackpoints[0];
        assert_eq!(
            point.time.unwrap().to_rfc3339(),
            "2024-05-01T07:00:00+00:00"
        );
        assert_eq!(point.heart_rate, Some(121.0));
        assert_eq!(point.cadence, Some(80.0));
        assert_eq!(point.altitude_m, Some(12.5));
        assert_eq!(point.distance_m, Some(3.2));
    }

    #[test]
    fn malformed_fields_are_dropped_individually() {
        let xml = document(
            "<Trackpoint><Time>yesterday</Time><HeartRateBpm><Value>n/a</Value></HeartRateBpm>\
             <Cadence> 88 </Cadence><AltitudeMeters>NaN</AltitudeMeters></Trackpoint>",
        );
        let point = &parse_trace_text(&xml).unwrap().trackpoints[0];

        assert_eq!(point.time, None);
        assert_eq!(point.heart_rate, None);
        assert_eq!(point.cadence, Some(88.0));
        assert_eq!(point.altitude_m, None);
    }

    #[test]
    fn elements_outside_the_namespace_are_ignored() {
        let xml = r#"<TrainingCenterDatabase><Trackpoint><Time>2024-05-01T07:00:00Z</Time></Trackpoint></TrainingCenterDatabase>"#;
        assert!(matches!(
            parse_trace_text(xml),
            Err(TcxError::NoTrackpoints)
        ));
    }

    #[test]
    fn timestamps_with_offsets_and_without_zone_are_accepted() {
        assert_eq!(
            parse_timestamp("2024-05-01T09:00:00+02:00"),
            parse_timestamp("2024-05-01T07:00:00Z")
        );
        assert_eq!(
            parse_timestamp("2024-05-01T07:00:00.500"),
            parse_timestamp("2024-05-01T07:00:00.5Z")
        );
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn utf16_with_bom_is_decoded() {
        let xml = document("<Trackpoint><Time>2024-05-01T07:00:00Z</Time></Trackpoint>");
        let mut bytes = UTF16_LE_BOM.to_vec();
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let trace = parse_trace_bytes(&bytes).unwrap();
        assert_eq!(trace.trackpoints.len(), 1);
    }

    #[test]
    fn invalid_utf8_is_rejected_strictly_but_dropped_leniently() {
        let bytes = b"<a>\xFFok</a>";
        assert!(matches!(decode_tcx_bytes(bytes), Err(TcxError::Decode(_))));
        assert_eq!(decode_utf8_ignoring_invalid(bytes), "<a>ok</a>");
    }
}
