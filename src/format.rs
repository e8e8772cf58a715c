use crate::series::{LabelSet, Sample, Series};

/// Type token written for metrics without an explicit type.
pub const UNTYPED: &str = "UNTYPED";

/// Escapes a label value for the text format, in a single pass.
/// Example:
/// ```
/// use prom_textfile::format::escape_label_value;
/// assert_eq!(escape_label_value("plain"), "plain");
/// assert_eq!(escape_label_value(r#"C:\dir"#), r#"C:\\dir"#);
/// assert_eq!(escape_label_value("say \"hi\"\n"), r#"say \"hi\"\n"#);
/// assert_eq!(escape_label_value(r"\n"), r"\\n");
/// ```
pub fn escape_label_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Renders a label set as `{a="x",b="y",}`, with `le` appended last when given.
/// An empty set without `le` renders as nothing.
pub fn render_labels(labels: &LabelSet, le: Option<&str>) -> String {
    if labels.is_empty() && le.is_none() {
        return String::new();
    }
    let mut out = String::from("{");
    for (name, value) in labels.iter() {
        out.push_str(&format!("{}=\"{}\",", name, escape_label_value(value)));
    }
    // Bounds are numbers or +Inf, no escaping needed.
    if let Some(bound) = le {
        out.push_str(&format!("le=\"{}\",", bound));
    }
    out.push('}');
    out
}

fn sample_line(name: &str, labels: &str, value: &str, timestamp: Option<&str>) -> String {
    match timestamp {
        Some(ts) => format!("{}{} {} {}", name, labels, value, ts),
        None => format!("{}{} {}", name, labels, value),
    }
}

/// Turns one series into its exposition lines, header block first if asked.
pub fn render(series: &Series, header: bool) -> Vec<String> {
    let mut lines = vec![];
    let name = series.name.as_str();
    if header {
        lines.push(format!("# HELP {} {}", name, series.comment));
        lines.push(format!(
            "# TYPE {} {}",
            name,
            series.metric_type.as_deref().unwrap_or(UNTYPED)
        ));
    }

    let timestamp = series.timestamp.as_deref();
    let labels = render_labels(&series.labels, None);
    match &series.sample {
        Sample::Scalar(value) => lines.push(sample_line(name, &labels, value, timestamp)),
        Sample::Histogram {
            buckets,
            sum,
            count,
        } => {
            let bucket_name = format!("{}_bucket", name);
            for bucket in buckets {
                let bucket_labels = render_labels(&series.labels, Some(bucket.bound.as_str()));
                lines.push(sample_line(
                    &bucket_name,
                    &bucket_labels,
                    &bucket.count,
                    timestamp,
                ));
            }
            lines.push(sample_line(
                &format!("{}_sum", name),
                &labels,
                sum,
                timestamp,
            ));
            lines.push(sample_line(
                &format!("{}_count", name),
                &labels,
                count,
                timestamp,
            ));
        }
    }
    lines
}
