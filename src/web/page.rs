//! Server-rendered form page.

use std::fmt::Write;

use crate::config::{FormConfig, Slider};
use crate::record::PropertyRecord;

/// What to show below the form.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Empty,
    Price {
        formatted: String,
        street: Option<String>,
    },
    Error(String),
    ModelMissing,
}

const STYLE: &str = r#"
body { font-family: sans-serif; background-color: #F5F5F5; margin: 0; display: flex; }
aside { width: 320px; padding: 24px; background: #FFFFFF; border-right: 1px solid #E0E0E0; min-height: 100vh; }
main { flex: 1; padding: 32px; }
label { display: block; margin-top: 14px; font-weight: bold; }
input[type=range], select, input[type=text] { width: 100%; margin-top: 6px; }
hr { border: none; border-top: 1px solid #E0E0E0; margin: 18px 0; }
button { margin-top: 22px; width: 100%; background-color: #4CAF50; color: white; border: none;
  border-radius: 12px; padding: 10px 24px; font-size: 16px; font-weight: bold; cursor: pointer; }
.metric { background-color: #FFFFFF; border: 1px solid #E0E0E0; border-radius: 12px; padding: 20px;
  max-width: 480px; animation: rise 0.8s ease-out; }
.metric .value { font-size: 2.4em; font-weight: bold; margin: 8px 0; }
.success { background: #E8F5E9; color: #2E7D32; padding: 12px; border-radius: 8px; margin-top: 12px; }
.warning { background: #FFF8E1; color: #8D6E00; padding: 12px; border-radius: 8px; }
.error { background: #FFEBEE; color: #C62828; padding: 12px; border-radius: 8px; }
@keyframes rise { from { opacity: 0; transform: translateY(24px); } to { opacity: 1; transform: none; } }
"#;

/// Escape text for HTML element and attribute contexts.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn slider(out: &mut String, name: &str, label: &str, spec: &Slider, value: f64) {
    let _ = write!(
        out,
        r#"<label for="{name}">{label}: <output id="{name}-value">{value}</output></label>
<input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}"
  oninput="document.getElementById('{name}-value').value = this.value">
"#,
        min = spec.min,
        max = spec.max,
        step = spec.step,
    );
}

fn select<'a>(
    out: &mut String,
    name: &str,
    label: &str,
    options: impl IntoIterator<Item = &'a str>,
    selected: &str,
) {
    let _ = writeln!(out, r#"<label for="{name}">{label}</label><select id="{name}" name="{name}">"#);
    for option in options {
        let option = escape_html(option);
        let marker = if option == escape_html(selected) { " selected" } else { "" };
        let _ = writeln!(out, r#"<option value="{option}"{marker}>{option}</option>"#);
    }
    out.push_str("</select>\n");
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn outcome_html(out: &mut String, outcome: &Outcome) {
    match outcome {
        Outcome::Empty => {}
        Outcome::Price { formatted, street } => {
            out.push_str("<hr><div class=\"metric\"><h3>Predicted Property Value</h3>\n");
            let _ = writeln!(
                out,
                r#"<div>Estimated Price</div><div class="value" id="price">{}</div>"#,
                escape_html(formatted)
            );
            if let Some(street) = street {
                let _ = writeln!(out, "<div>{}</div>", escape_html(street));
            }
            out.push_str(
                "<div class=\"success\">The prediction is based on the features provided. \
                 Market conditions can influence the final price.</div></div>\n",
            );
        }
        Outcome::Error(message) => {
            let _ = writeln!(out, r#"<div class="error">{}</div>"#, escape_html(message));
        }
        Outcome::ModelMissing => {
            out.push_str(
                "<div class=\"warning\">Model files not found! Please make sure the model \
                 and column files are in place before trying to predict.</div>\n",
            );
        }
    }
}

/// Render the whole page with `values` in the widgets.
pub fn render(form: &FormConfig, values: &PropertyRecord, outcome: &Outcome) -> String {
    let title = escape_html(&form.title);
    let bounds = &form.bounds;
    let mut out = String::with_capacity(8 * 1024);

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{title}</title><style>{STYLE}</style></head><body>\n\
         <aside><h2>Enter Property Details</h2>\n<form method=\"post\" action=\"/predict\">\n"
    );

    slider(&mut out, "area", "Area (sqft)", &bounds.area, values.area);
    slider(&mut out, "bedrooms", "Bedrooms", &bounds.bedrooms, f64::from(values.bedrooms));
    slider(&mut out, "bathrooms", "Bathrooms", &bounds.bathrooms, f64::from(values.bathrooms));
    out.push_str("<hr>\n");

    select(&mut out, "mainroad", "Is it on a Main Road?", ["Yes", "No"], yes_no(values.mainroad));
    select(&mut out, "basement", "Does it have a Basement?", ["No", "Yes"], yes_no(values.basement));
    slider(&mut out, "parking", "Parking Spots", &bounds.parking, f64::from(values.parking));
    out.push_str("<hr>\n");

    select(&mut out, "city", "City", form.cities.iter().map(String::as_str), &values.city);
    let _ = writeln!(
        out,
        r#"<label for="street">Street Address</label><input type="text" id="street" name="street" placeholder="e.g., 921 Isabella Way" value="{}">"#,
        escape_html(values.street.as_deref().unwrap_or_default())
    );
    out.push_str("<button type=\"submit\">Predict Price</button>\n</form></aside>\n");

    let _ = write!(
        out,
        "<main><h1>&#127969; {title}</h1>\n<p>Enter the details of a property to get an \
         estimated market value.</p><hr>\n"
    );
    outcome_html(&mut out, outcome);
    out.push_str("</main></body></html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PropertyRecord {
        PropertyRecord::from_defaults(&FormConfig::default().bounds, "Brea")
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn renders_widgets_with_bounds_and_selection() {
        let html = render(&FormConfig::default(), &record(), &Outcome::Empty);
        assert!(html.contains(r#"name="area" min="500" max="30000" step="100" value="2500""#));
        assert!(html.contains(r#"<option value="Brea" selected>Brea</option>"#));
        assert!(html.contains(r#"<option value="Irvine">Irvine</option>"#));
        assert!(html.contains(r#"<option value="Yes" selected>Yes</option>"#));
        assert!(html.contains("Predict Price"));
        assert!(!html.contains("Estimated Price"));
    }

    #[test]
    fn renders_outcomes() {
        let mut values = record();
        values.street = Some("<script>alert(1)</script>".to_string());
        let html = render(
            &FormConfig::default(),
            &values,
            &Outcome::Price {
                formatted: "₹ 4,500,000".to_string(),
                street: values.street.clone(),
            },
        );
        assert!(html.contains("₹ 4,500,000"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));

        let html = render(&FormConfig::default(), &record(), &Outcome::ModelMissing);
        assert!(html.contains("Model files not found"));
    }
}
