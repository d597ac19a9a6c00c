use crate::processing::ProcessedTcx;
use crate::processing::display::{
    format_distance, format_drift, format_duration, format_pace, pace_per_mile,
};

const MISSING: &str = "—";

fn or_missing(value: Option<String>) -> String {
    value.unwrap_or_else(|| MISSING.to_string())
}

fn format_heart_rate(value: f64) -> String {
    if value.is_finite() && value > 0.0 {
        format!("{:.0} bpm", value.round())
    } else {
        MISSING.to_string()
    }
}

fn summary_card(label: &str, value: &str) -> String {
    format!(
        "<div class=\"summary-card\"><p class=\"label\">{label}</p><p class=\"value\">{value}</p></div>"
    )
}

pub fn render_landing_page() -> String {
    include_str!("../templates/landing.html").to_string()
}

pub fn render_parse_failure() -> String {
    "<section class=\"results-card error\"><p>Could not parse TCX (try again or upload a different file).</p></section>"
        .to_string()
}

pub fn render_processed_tcx(processed: &ProcessedTcx) -> String {
    let metrics = &processed.metrics;
    let mut body = String::new();

    body.push_str("<section class=\"results-card\">");
    body.push_str(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Session Overview</p><h2>TCX parsed</h2></div></div>",
    );

    body.push_str("<div class=\"summary-grid\">");
    body.push_str(&summary_card("Duration", &format_duration(metrics.duration_sec)));
    body.push_str(&summary_card(
        "Distance",
        &if metrics.distance_m > 0.0 {
            format_distance(metrics.distance_m)
        } else {
            MISSING.to_string()
        },
    ));
    body.push_str(&summary_card(
        "Pace",
        &or_missing(format_pace(metrics.pace_min_per_km).map(|pace| format!("{pace} min/km"))),
    ));
    body.push_str(&summary_card(
        "Pace (mile)",
        &or_missing(
            pace_per_mile(metrics)
                .and_then(format_pace)
                .map(|pace| format!("{pace} min/mi")),
        ),
    ));
    body.push_str(&summary_card("Heart Rate (avg)", &format_heart_rate(metrics.avg_hr)));
    body.push_str(&summary_card("Heart Rate (max)", &format_heart_rate(metrics.max_hr)));
    body.push_str(&summary_card("HR Drift", &format_drift(metrics.hr_drift)));
    body.push_str(&summary_card(
        "Cadence (avg)",
        &if metrics.avg_cadence > 0.0 {
            format!("{:.0}", metrics.avg_cadence)
        } else {
            MISSING.to_string()
        },
    ));
    body.push_str(&summary_card(
        "Elevation Gain",
        &format!("{:.0} m", metrics.elevation_gain_m),
    ));
    body.push_str("</div>");
    body.push_str("</section>");

    let autofill = &processed.autofill;
    body.push_str("<section class=\"results-card\">");
    body.push_str(
        "<div class=\"results-header\"><div><p class=\"eyebrow\">Log auto-fill</p><h2>Values for this session</h2></div></div>",
    );
    body.push_str("<ul class=\"autofill\">");
    body.push_str(&format!(
        "<li><strong>Duration</strong>: {}</li>",
        or_missing(autofill.duration_min.map(|min| format!("{min} min")))
    ));
    body.push_str(&format!(
        "<li><strong>Distance</strong>: {}</li>",
        or_missing(autofill.distance_mi.map(|mi| format!("{mi:.2} mi")))
    ));
    body.push_str(&format!(
        "<li><strong>Avg HR</strong>: {}</li>",
        or_missing(autofill.avg_hr.map(|hr| hr.to_string()))
    ));
    body.push_str(&format!(
        "<li><strong>Max HR</strong>: {}</li>",
        or_missing(autofill.max_hr.map(|hr| hr.to_string()))
    ));
    body.push_str(&format!(
        "<li><strong>Elevation</strong>: {}</li>",
        or_missing(autofill.elevation_gain_m.map(|gain| format!("{gain} m")))
    ));
    body.push_str("</ul>");
    body.push_str("</section>");

    if processed.time_in_zones.iter().any(|zone| zone.seconds > 0.0) {
        body.push_str("<section class=\"results-card\">");
        body.push_str(
            "<div class=\"results-header\"><div><p class=\"eyebrow\">Heart rate</p><h2>HR Time in Zones</h2></div></div>",
        );
        body.push_str("<div class=\"table-wrapper\"><table><thead><tr><th>Zone</th><th>Minutes</th></tr></thead><tbody>");
        for zone in &processed.time_in_zones {
            body.push_str(&format!(
                "<tr><td>Z{}</td><td>{:.1}</td></tr>",
                zone.zone,
                zone.seconds / 60.0
            ));
        }
        body.push_str("</tbody></table></div>");
        body.push_str("</section>");
    }

    body
}
