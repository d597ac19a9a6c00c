pub mod display;
pub mod parse;
pub mod summary;
pub mod types;
pub mod zones;

use parse::decode_utf8_ignoring_invalid;
use std::io::{Read, Seek, SeekFrom};
use zones::time_in_zones;

pub use parse::{parse_trace_bytes, parse_trace_text};
pub use summary::reduce_trace;
pub use types::{
    ActivityMetrics, ActivityTrace, CardioAutofill, HeartRateZones, ProcessedTcx, TcxError,
    Trackpoint, ZoneTime,
};

/// Reduce raw TCX file bytes to summary metrics.
///
/// Returns `None` for malformed documents, documents without trackpoints,
/// and traces with fewer than two timestamped trackpoints.
pub fn reduce_from_bytes(bytes: &[u8]) -> Option<ActivityMetrics> {
    discard_error(parse_trace_bytes(bytes).and_then(|trace| reduce_trace(&trace)))
}

/// Reduce already-decoded TCX text. The text is parsed directly and never
/// re-encoded.
pub fn reduce_from_text(text: &str) -> Option<ActivityMetrics> {
    discard_error(parse_trace_text(text).and_then(|trace| reduce_trace(&trace)))
}

/// Read a stream to its end once and reduce it on the binary path.
pub fn reduce_from_reader<R: Read>(mut reader: R) -> Option<ActivityMetrics> {
    let mut bytes = Vec::new();
    if let Err(err) = reader.read_to_end(&mut bytes) {
        return discard_error(Err(TcxError::Io(err)));
    }
    reduce_from_bytes(&bytes)
}

/// Reduce an uploaded file, falling back to a lenient text decode.
///
/// The binary path runs first. If it yields nothing the upload is rewound,
/// decoded as UTF-8 with undecodable bytes dropped, and retried as text.
pub fn reduce_from_upload<R: Read + Seek>(upload: R) -> Option<ActivityMetrics> {
    discard_error(load_trace_from_upload(upload).and_then(|trace| reduce_trace(&trace)))
}

/// Parse an upload into metrics, auto-fill values, and time in zones.
pub fn process_tcx_upload<R: Read + Seek>(
    upload: R,
    zones: &HeartRateZones,
) -> Result<ProcessedTcx, TcxError> {
    let trace = load_trace_from_upload(upload)?;
    let metrics = reduce_trace(&trace)?;

    Ok(ProcessedTcx {
        autofill: CardioAutofill::from_metrics(&metrics),
        time_in_zones: time_in_zones(&trace, zones),
        metrics,
    })
}

/// Binary decode first, then the lenient text decode. A trace counts as
/// loaded only if it also reduces, so a file whose strict decode yields too
/// few timestamps still gets the second attempt.
fn load_trace_from_upload<R: Read + Seek>(mut upload: R) -> Result<ActivityTrace, TcxError> {
    let mut bytes = Vec::new();
    upload.read_to_end(&mut bytes)?;

    let binary_err = match parse_trace_bytes(&bytes) {
        Ok(trace) => match reduce_trace(&trace) {
            Ok(_) => return Ok(trace),
            Err(err) => err,
        },
        Err(err) => err,
    };
    tracing::debug!(error = %binary_err, "binary TCX parse failed, retrying as text");

    upload.seek(SeekFrom::Start(0))?;
    bytes.clear();
    upload.read_to_end(&mut bytes)?;

    let text = decode_utf8_ignoring_invalid(&bytes);
    parse_trace_text(&text)
}

fn discard_error(result: Result<ActivityMetrics, TcxError>) -> Option<ActivityMetrics> {
    result
        .map_err(|err| tracing::debug!(error = %err, "TCX reduction produced no result"))
        .ok()
}
