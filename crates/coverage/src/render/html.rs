//! Self-contained HTML reports with inline styles

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

use crate::istanbul::{FileSummary, SourceTotals};
use crate::summary::{Summary, Threshold};
use crate::v8::ByteCoverage;

const BASE_STYLE: &str = r#"
    * { box-sizing: border-box; }
    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
      margin: 0 auto;
      padding: 20px;
      background: #f5f5f5;
    }
    h1 { color: #333; border-bottom: 2px solid #4CAF50; padding-bottom: 10px; }
    .summary {
      background: white;
      padding: 20px;
      border-radius: 8px;
      margin-bottom: 20px;
      box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    table {
      width: 100%;
      border-collapse: collapse;
      background: white;
      border-radius: 8px;
      overflow: hidden;
      box-shadow: 0 2px 4px rgba(0,0,0,0.1);
    }
    th, td { padding: 10px 16px; text-align: left; }
    th { background: #333; color: white; font-weight: 500; }
    tr:nth-child(even) { background: #f9f9f9; }
    tr:hover { background: #f0f0f0; }
    .bar-container {
      background: #e0e0e0;
      border-radius: 4px;
      overflow: hidden;
      display: inline-block;
      vertical-align: middle;
    }
    .bar { border-radius: 4px; }
    .bar.high { background: #4CAF50; }
    .bar.medium { background: #FF9800; }
    .bar.low { background: #f44336; }
    .pct { font-weight: 500; }
    .pct.high { color: #4CAF50; }
    .pct.medium { color: #FF9800; }
    .pct.low { color: #f44336; }
    .timestamp { color: #999; font-size: 12px; margin-top: 20px; }
"#;

/// Escape text for element content and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
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

fn kb(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

fn timestamp(generated_at: DateTime<Utc>) -> String {
    generated_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn bar(pct: f64, width_px: u32, height_px: u32) -> String {
    let class = Threshold::classify(pct).css_class();
    format!(
        r#"<div class="bar-container" style="width: {w}px"><div class="bar {class}" style="width: {pct:.1}%; height: {h}px"></div></div>"#,
        w = width_px,
        h = height_px,
        class = class,
        pct = pct,
    )
}

fn page(title: &str, extra_style: &str, body: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>{title}</title>
  <style>{base}{extra}  </style>
</head>
<body>
{body}
  <div class="timestamp">Generated: {ts}</div>
</body>
</html>
"#,
        title = escape(title),
        base = BASE_STYLE,
        extra = extra_style,
        body = body,
        ts = timestamp(generated_at),
    )
}

/// Byte-level report for served bundles
pub fn render_v8_report(coverage: &ByteCoverage, generated_at: DateTime<Utc>) -> String {
    let total = coverage.total();
    let total_pct = total.pct();
    let band = Threshold::classify(total_pct);

    let extra = format!(
        r#"
    body {{ max-width: 1200px; }}
    .total-pct {{ font-size: 48px; font-weight: bold; color: {color}; }}
    .total-detail {{ color: #666; }}
    .note {{
      margin-top: 20px;
      padding: 15px;
      background: #fff3cd;
      border-radius: 8px;
      border-left: 4px solid #ffc107;
    }}
"#,
        color = band.color()
    );

    let mut rows = String::new();
    for (url, summary) in coverage.rows() {
        let pct = summary.pct();
        let class = Threshold::classify(pct).css_class();
        let _ = write!(
            rows,
            r#"
      <tr>
        <td><code>{url}</code></td>
        <td class="pct {class}">{pct:.1}%</td>
        <td>{bar}</td>
        <td>{size}</td>
      </tr>"#,
            url = escape(url),
            class = class,
            pct = pct,
            bar = bar(pct, 200, 20),
            size = kb(summary.total),
        );
    }

    let body = format!(
        r#"  <h1>Frontend Coverage Report</h1>

  <div class="summary">
    <h2>Overall Coverage</h2>
    <div class="total-pct">{pct:.1}%</div>
    <div class="total-detail">{covered} of {total} covered</div>
  </div>

  <table>
    <thead>
      <tr>
        <th>File</th>
        <th>Coverage</th>
        <th></th>
        <th>Size</th>
      </tr>
    </thead>
    <tbody>{rows}
    </tbody>
  </table>

  <div class="note">
    <strong>Note:</strong> This report shows byte-level coverage of bundled JavaScript.
    For line-level TypeScript coverage, build the UI with instrumentation enabled and
    use the Istanbul report instead.
  </div>
"#,
        pct = total_pct,
        covered = kb(total.covered),
        total = kb(total.total),
        rows = rows,
    );

    page("Frontend Coverage Report", &extra, &body, generated_at)
}

fn summary_tile(label: &str, summary: Summary) -> String {
    let pct = summary.pct();
    format!(
        r#"
    <div class="summary-item">
      <h3>{label}</h3>
      <div class="summary-pct {class}">{pct:.1}%</div>
      <div class="summary-detail">{covered}/{total}</div>
    </div>"#,
        label = label,
        class = Threshold::classify(pct).css_class(),
        pct = pct,
        covered = summary.covered,
        total = summary.total,
    )
}

fn metric_cell(summary: Summary) -> String {
    let pct = summary.pct();
    format!(
        r#"<td>{bar} <span class="pct {class}">{pct:.0}%</span></td>"#,
        bar = bar(pct, 80, 16),
        class = Threshold::classify(pct).css_class(),
        pct = pct,
    )
}

/// Statement/branch/function report for instrumented sources
pub fn render_istanbul_report(
    files: &[FileSummary],
    totals: &SourceTotals,
    generated_at: DateTime<Utc>,
) -> String {
    let extra = r#"
    body { max-width: 1400px; }
    .summary { display: flex; gap: 40px; }
    .summary-item { text-align: center; }
    .summary-item h3 { margin: 0 0 10px 0; color: #666; font-size: 14px; }
    .summary-pct { font-size: 36px; font-weight: bold; }
    .summary-pct.high { color: #4CAF50; }
    .summary-pct.medium { color: #FF9800; }
    .summary-pct.low { color: #f44336; }
    .summary-detail { color: #666; font-size: 12px; }
    th:not(:first-child) { text-align: center; width: 120px; }
    td:not(:first-child) { text-align: center; }
    .file-path { font-family: monospace; font-size: 13px; }
"#;

    let mut rows = String::new();
    for file in files {
        let _ = write!(
            rows,
            r#"
      <tr>
        <td class="file-path">{path}</td>
        {statements}
        {branches}
        {functions}
      </tr>"#,
            path = escape(&file.path),
            statements = metric_cell(file.statements),
            branches = metric_cell(file.branches),
            functions = metric_cell(file.functions),
        );
    }

    let body = format!(
        r#"  <h1>Frontend Coverage Report (TypeScript)</h1>

  <div class="summary">{statements}{branches}{functions}
  </div>

  <table>
    <thead>
      <tr>
        <th>File</th>
        <th>Statements</th>
        <th>Branches</th>
        <th>Functions</th>
      </tr>
    </thead>
    <tbody>{rows}
    </tbody>
  </table>
"#,
        statements = summary_tile("Statements", totals.statements),
        branches = summary_tile("Branches", totals.branches),
        functions = summary_tile("Functions", totals.functions),
        rows = rows,
    );

    page("Frontend Coverage Report (TypeScript)", extra, &body, generated_at)
}
