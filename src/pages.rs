// src/pages.rs
//! Server-rendered HTML. Every dynamic value goes through `esc`/`esc_attr`.

use std::fmt::Write as _;

use crate::currencies::{display_name, CURRENCIES};
use crate::upstream::{HistoryPoint, RateSnapshot};

fn esc(s: &str) -> String {
    html_escape::encode_text(s).to_string()
}

fn esc_attr(s: &str) -> String {
    html_escape::encode_double_quoted_attribute(s).to_string()
}

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/convert", "Converter"),
    ("/dashboard", "Dashboard"),
    ("/settings", "Settings"),
    ("/about", "About"),
];

// Registers the service worker and forwards stream events to the page and,
// once permission is granted, to system notifications via the worker.
const CLIENT_SCRIPT: &str = r#"<script>
if ("serviceWorker" in navigator) {
  navigator.serviceWorker.register("/service-worker.js");
}
function systemNotify(ev) {
  if (!window.Notification || Notification.permission !== "granted") return;
  const worker = navigator.serviceWorker && navigator.serviceWorker.controller;
  if (!worker) return;
  worker.postMessage({
    type: "SHOW_NOTIFICATION",
    title: ev.type === "rate" ? "Rate update" : "Finance news",
    body: ev.message,
  });
}
if (window.EventSource && localStorage.getItem("notifications") !== "off") {
  const es = new EventSource("/stream");
  es.onmessage = (e) => {
    const ev = JSON.parse(e.data);
    systemNotify(ev);
    const box = document.getElementById("notifications");
    if (!box) return;
    const li = document.createElement("li");
    li.className = "note note-" + ev.type;
    li.textContent = ev.message;
    box.prepend(li);
  };
}
</script>"#;

fn layout(title: &str, active: &str, body: &str) -> String {
    let mut nav = String::new();
    for (href, label) in NAV {
        let class = if *href == active { " class=\"active\"" } else { "" };
        let _ = write!(nav, "<a href=\"{href}\"{class}>{label}</a>");
    }
    format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
<title>{title} · Currency Pulse</title>\n\
<link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n\
<nav>{nav}</nav>\n<main>\n{body}\n</main>\n<ul id=\"notifications\"></ul>\n{CLIENT_SCRIPT}\n</body>\n</html>\n",
        title = esc(title),
    )
}

pub fn index_page() -> String {
    layout(
        "Home",
        "/",
        "<h1>Currency Pulse</h1>\n\
<p>Live exchange rates, a quick converter, and finance headlines in one place.</p>\n\
<ul>\n<li><a href=\"/convert\">Convert an amount</a></li>\n\
<li><a href=\"/dashboard\">Open the rates dashboard</a></li>\n</ul>",
    )
}

fn currency_options(selected: &str) -> String {
    let mut out = String::new();
    for (code, name) in CURRENCIES {
        let sel = if *code == selected { " selected" } else { "" };
        let _ = writeln!(
            out,
            "<option value=\"{}\"{sel}>{} – {}</option>",
            esc_attr(code),
            esc(code),
            esc(name)
        );
    }
    out
}

/// Converter form state. `result` is `Some(None)` when a conversion was
/// attempted but upstream had no answer.
#[derive(Debug, Clone)]
pub struct ConverterView<'a> {
    pub amount: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub result: Option<Option<f64>>,
    pub error: Option<&'a str>,
}

impl Default for ConverterView<'_> {
    fn default() -> Self {
        Self {
            amount: "1",
            from: "USD",
            to: "EUR",
            result: None,
            error: None,
        }
    }
}

pub fn converter_page(view: &ConverterView<'_>) -> String {
    let mut body = String::from("<h1>Quick converter</h1>\n");
    if let Some(err) = view.error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", esc(err));
    }
    let _ = write!(
        body,
        "<form method=\"post\" action=\"/convert\">\n\
<label>Amount <input name=\"amount\" type=\"text\" inputmode=\"decimal\" value=\"{amount}\"></label>\n\
<label>From <select name=\"from_currency\">\n{from_opts}</select></label>\n\
<label>To <select name=\"to_currency\">\n{to_opts}</select></label>\n\
<button type=\"submit\">Convert</button>\n</form>\n",
        amount = esc_attr(view.amount),
        from_opts = currency_options(view.from),
        to_opts = currency_options(view.to),
    );
    match view.result {
        Some(Some(v)) => {
            let _ = writeln!(
                body,
                "<p class=\"result\">{} {} = <strong>{}</strong> {}</p>",
                esc(view.amount),
                esc(view.from),
                v,
                esc(view.to)
            );
        }
        Some(None) => {
            body.push_str("<p class=\"result\">Conversion unavailable right now.</p>\n");
        }
        None => {}
    }
    layout("Converter", "/convert", &body)
}

const CHART_W: f64 = 300.0;
const CHART_H: f64 = 100.0;
const CHART_PAD: f64 = 4.0;

/// Inline SVG line chart of the trend. A flat series sits mid-height.
fn trend_svg(history: &[HistoryPoint]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let (lo, hi) = history
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.rate), hi.max(p.rate))
        });
    let inner_w = CHART_W - 2.0 * CHART_PAD;
    let inner_h = CHART_H - 2.0 * CHART_PAD;
    let step = if history.len() > 1 {
        inner_w / (history.len() - 1) as f64
    } else {
        0.0
    };

    let mut points = String::new();
    for (i, p) in history.iter().enumerate() {
        let x = if history.len() > 1 {
            CHART_PAD + step * i as f64
        } else {
            CHART_W / 2.0
        };
        let y = if hi > lo {
            CHART_PAD + (hi - p.rate) / (hi - lo) * inner_h
        } else {
            CHART_H / 2.0
        };
        if !points.is_empty() {
            points.push(' ');
        }
        let _ = write!(points, "{x:.1},{y:.1}");
    }

    format!(
        "<svg class=\"trend-chart\" viewBox=\"0 0 {CHART_W} {CHART_H}\" role=\"img\">\
<polyline fill=\"none\" stroke=\"currentColor\" stroke-width=\"2\" points=\"{points}\"/></svg>\n"
    )
}

pub fn dashboard_page(
    base: &str,
    rates: &RateSnapshot,
    quote: &str,
    history: &[HistoryPoint],
) -> String {
    let mut body = String::from("<h1>Dashboard</h1>\n");

    let _ = writeln!(body, "<h2>Live rates (1 {})</h2>", esc(base));
    body.push_str(
        "<table class=\"rates\">\n<tr><th>Code</th><th>Currency</th><th>Rate</th></tr>\n",
    );
    for (code, rate) in rates.iter() {
        let _ = writeln!(
            body,
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            esc(code),
            esc(display_name(code).unwrap_or(code)),
            rate
        );
    }
    body.push_str("</table>\n");

    let _ = writeln!(
        body,
        "<h2>{}→{} last {} days</h2>",
        esc(base),
        esc(quote),
        history.len()
    );
    body.push_str(&trend_svg(history));
    body.push_str("<table class=\"trend\">\n<tr><th>Date</th><th>Rate</th></tr>\n");
    for p in history {
        let _ = writeln!(body, "<tr><td>{}</td><td>{}</td></tr>", p.date, p.rate);
    }
    body.push_str("</table>\n");

    layout("Dashboard", "/dashboard", &body)
}

pub fn about_page() -> String {
    layout(
        "About",
        "/about",
        "<h1>About</h1>\n\
<p>Currency Pulse shows exchange rates, a seven-day trend, and business headlines \
pulled from public data providers. Values may be delayed; nothing here is financial advice.</p>",
    )
}

pub fn settings_page() -> String {
    layout(
        "Settings",
        "/settings",
        "<h1>Settings</h1>\n\
<label><input type=\"checkbox\" id=\"notify-toggle\" checked> Live notifications</label>\n\
<script>\n\
const t = document.getElementById(\"notify-toggle\");\n\
t.checked = localStorage.getItem(\"notifications\") !== \"off\";\n\
t.onchange = () => {\n\
  localStorage.setItem(\"notifications\", t.checked ? \"on\" : \"off\");\n\
  if (t.checked && window.Notification) Notification.requestPermission();\n\
};\n\
</script>\n\
<h2>Contact us</h2>\n\
<form method=\"post\" action=\"/send_message\">\n\
<label>Name <input name=\"name\" required></label>\n\
<label>Email <input name=\"email\" type=\"email\" required></label>\n\
<label>Message <textarea name=\"message\" required></textarea></label>\n\
<button type=\"submit\">Send</button>\n</form>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn converter_escapes_user_input() {
        let view = ConverterView {
            amount: "<script>",
            error: Some("bad <amount>"),
            ..ConverterView::default()
        };
        let html = converter_page(&view);
        assert!(!html.contains("value=\"<script>\""));
        assert!(html.contains("&lt;amount&gt;"));
    }

    #[test]
    fn converter_marks_selected_currencies() {
        let view = ConverterView {
            from: "GHS",
            to: "NGN",
            result: Some(Some(123.5)),
            ..ConverterView::default()
        };
        let html = converter_page(&view);
        assert!(html.contains("<option value=\"GHS\" selected>"));
        assert!(html.contains("<option value=\"NGN\" selected>"));
        assert!(html.contains("<strong>123.5</strong>"));
    }

    fn point(day: u32, rate: f64) -> HistoryPoint {
        HistoryPoint {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            rate,
        }
    }

    #[test]
    fn dashboard_draws_trend_chart() {
        let codes = vec!["EUR".to_string()];
        let rates = RateSnapshot::from_rates(&codes, |_| Some(0.9));
        let hist = vec![point(1, 1.0), point(2, 2.0), point(3, 3.0)];
        let html = dashboard_page("USD", &rates, "EUR", &hist);
        assert!(html.contains("<td>Euro</td>"));
        assert!(html.contains(r#"points="4.0,96.0 150.0,50.0 296.0,4.0""#));
        assert!(!html.contains("trend-data"));
    }

    #[test]
    fn flat_or_single_point_trend_sits_mid_height() {
        let flat = trend_svg(&[point(1, 0.5), point(2, 0.5)]);
        assert!(flat.contains(r#"points="4.0,50.0 296.0,50.0""#));
        assert!(trend_svg(&[point(1, 0.5)]).contains(r#"points="150.0,50.0""#));
        assert_eq!(trend_svg(&[]), "");
    }

    #[test]
    fn stream_events_are_forwarded_to_the_service_worker() {
        let html = index_page();
        assert!(html.contains(r#"type: "SHOW_NOTIFICATION""#));
        assert!(settings_page().contains("Notification.requestPermission()"));
    }
}
