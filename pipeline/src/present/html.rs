use super::{
    escape_html,
    format_count,
    format_percent,
    gauge::Gauge,
    Presenter,
};
use crate::{
    sites::Site,
    MetricsError,
    MetricsReport,
    MetricsTable,
    Period,
};
use std::fmt::Write as _;
use strum::IntoEnumIterator as _;
use terminus_metrics_config::RequestDefaults;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, Helvetica, Arial, sans-serif; margin: 0; background: #f5f6f8; color: #222; }
main { max-width: 960px; margin: 0 auto; padding: 24px; }
h1 { margin-top: 0; }
section { background: #fff; border-radius: 6px; padding: 16px 20px; margin-bottom: 18px; box-shadow: 0 1px 2px rgba(0,0,0,.08); }
form { display: flex; flex-wrap: wrap; gap: 12px; align-items: flex-end; }
label { display: flex; flex-direction: column; font-size: 13px; gap: 4px; }
input, select { padding: 6px 8px; font-size: 14px; }
button { padding: 8px 16px; font-size: 14px; background: #1f3b73; color: #fff; border: 0; border-radius: 4px; cursor: pointer; }
table { border-collapse: collapse; width: 100%; font-size: 13px; }
th, td { border-bottom: 1px solid #e6e6e6; padding: 6px 8px; text-align: right; }
th:first-child, td:first-child { text-align: left; }
pre { background: #1e1e1e; color: #ddd; padding: 12px; overflow-x: auto; font-size: 12px; }
.error { border-left: 5px solid #d62728; }
.warning { border-left: 5px solid #ff7f0e; }
.no-data { text-align: center; color: #666; }
.note { font-style: italic; }
.chart svg, .gauge svg { max-width: 100%; height: auto; }
"#;

/// Values shown in the dashboard form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub site: String,
    pub environment: String,
    pub period: Period,
}

impl From<&RequestDefaults> for FormState {
    fn from(defaults: &RequestDefaults) -> Self {
        Self {
            site: defaults.site.clone(),
            environment: defaults.environment.clone(),
            period: defaults.period,
        }
    }
}

/// What the dashboard shows below the form.
#[derive(Debug)]
pub enum View<'a> {
    /// Nothing submitted yet.
    Form,
    /// The submission did not pass validation; terminus was never run.
    Rejected(&'a MetricsError),
    Report(&'a MetricsReport),
}

impl Presenter {
    pub fn dashboard_page(&self, form: &FormState, view: View<'_>) -> String {
        let mut body = String::new();
        body.push_str(
            "<section><h1>Terminus Metrics</h1><p>Enter a Pantheon site and environment to chart its traffic and \
             cache efficiency as reported by <code>terminus env:metrics</code>.</p>",
        );
        body.push_str(&form_html(form));
        body.push_str("</section>");

        match view {
            View::Form => {}
            View::Rejected(err) => body.push_str(&error_section(err)),
            View::Report(report) => body.push_str(&self.report_sections(report, true)),
        }
        page("Terminus Metrics", &body)
    }

    /// Standalone report without the form, used for `report --html`.
    pub fn report_page(&self, report: &MetricsReport) -> String {
        let body = format!(
            "<section><h1>Terminus Metrics</h1><p>{}</p></section>{}",
            escape_html(&report.request.to_string()),
            self.report_sections(report, false)
        );
        page(&format!("Metrics for {}", report.request.target()), &body)
    }

    pub fn sites_page(&self, sites: Result<&[Site], &MetricsError>, plans: &[String]) -> String {
        let mut body = String::from("<section><h1>Performance sites</h1>");
        let _ = write!(
            body,
            "<p>Sites on the plans: {}.</p>",
            escape_html(&plans.join(", "))
        );
        match sites {
            Err(err) => {
                body.push_str("</section>");
                body.push_str(&error_section(err));
            }
            Ok([]) => body.push_str("<p class=\"no-data\">No sites matched.</p></section>"),
            Ok(sites) => {
                body.push_str("<table><thead><tr><th>Name</th><th>Plan</th><th></th></tr></thead><tbody>");
                for site in sites {
                    let _ = write!(
                        body,
                        "<tr><td>{name}</td><td>{plan}</td><td><a href=\"/?site={name}&amp;env=live\">metrics</a></td></tr>",
                        name = escape_html(&site.name),
                        plan = escape_html(&site.plan)
                    );
                }
                body.push_str("</tbody></table></section>");
            }
        }
        page("Performance sites", &body)
    }

    fn report_sections(&self, report: &MetricsReport, link_csv: bool) -> String {
        let mut out = String::new();

        if let Some(err) = report.error() {
            out.push_str(&error_section(err));
        }

        let warnings = report.warnings();
        if !warnings.is_empty() {
            let _ = write!(
                out,
                "<section class=\"warning\"><h2>Terminus warnings</h2><pre>{}</pre></section>",
                escape_html(&warnings.join("\n"))
            );
        }

        match report.table() {
            Some(table) if !table.is_empty() => out.push_str(&self.table_sections(report, table, link_csv)),
            _ => {
                let _ = write!(
                    out,
                    "<section class=\"no-data\"><h2>No data</h2><p>No metrics are available for {}.</p></section>",
                    escape_html(&report.request.to_string())
                );
            }
        }

        if let Some(raw) = report.raw.as_ref().filter(|raw| !raw.stdout.trim().is_empty()) {
            let _ = write!(
                out,
                "<section><details><summary>Raw terminus output</summary><pre>{}</pre></details></section>",
                escape_html(&self.raw_output(&raw.stdout))
            );
        }
        out
    }

    fn table_sections(&self, report: &MetricsReport, table: &MetricsTable, link_csv: bool) -> String {
        let mut out = String::from("<section><h2>Summary</h2><table><tbody>");
        for line in self.summary_lines(&report.request, table) {
            let _ = write!(
                out,
                "<tr><th>{}</th><td>{}</td></tr>",
                line.label,
                escape_html(&line.value)
            );
        }
        out.push_str("</tbody></table></section>");

        let gauge = Gauge::new(table.summary().hit_ratio, self.bands);
        let _ = write!(
            out,
            "<section class=\"gauge\"><h2>Cache efficiency</h2>{}</section>",
            gauge.to_svg()
        );

        let _ = write!(
            out,
            "<section class=\"chart\">{}</section><section class=\"chart\">{}</section>",
            self.traffic_chart(table).to_svg(),
            self.ratio_chart(table).to_svg()
        );

        out.push_str("<section><h2>Metrics</h2>");
        if link_csv {
            let request = &report.request;
            let _ = write!(
                out,
                "<p><a href=\"/metrics.csv?site={}&amp;env={}&amp;period={}\" download=\"{}\">Download CSV</a></p>",
                escape_html(request.site()),
                escape_html(request.environment()),
                request.period(),
                escape_html(&request.csv_file_name())
            );
        }
        out.push_str(&self.metrics_table(table));
        if !table.warnings().is_empty() {
            out.push_str("<p>Some values could not be read; counts among them were treated as 0:</p><ul>");
            for warning in table.warnings() {
                let _ = write!(out, "<li>{}</li>", escape_html(&warning.to_string()));
            }
            out.push_str("</ul>");
        }
        out.push_str("</section>");

        let breakdown = self.breakdown(table);
        out.push_str("<section><h2>Cache hit ratio breakdown</h2>");
        if !breakdown.entries.is_empty() {
            out.push_str("<ul>");
            for (label, percent) in &breakdown.entries {
                let _ = write!(
                    out,
                    "<li>{}: {}</li>",
                    escape_html(label),
                    format_percent(*percent)
                );
            }
            out.push_str("</ul>");
        }
        let _ = write!(
            out,
            "<p class=\"note\" style=\"color: {}\">{}</p></section>",
            breakdown.band.color(),
            escape_html(&breakdown.note(self.bands.high))
        );
        out
    }

    fn metrics_table(&self, table: &MetricsTable) -> String {
        let pages = table.has_pages_served();
        let mut out = String::from("<table><thead><tr><th>Period</th><th>Visits</th>");
        if pages {
            out.push_str("<th>Pages Served</th>");
        }
        out.push_str("<th>Cache Hits</th><th>Cache Misses</th><th>Cache Hit Ratio</th></tr></thead><tbody>");
        for row in table.rows() {
            let _ = write!(
                out,
                "<tr><td>{}</td><td>{}</td>",
                escape_html(&self.label(row)),
                format_count(row.visits)
            );
            if pages {
                let _ = write!(
                    out,
                    "<td>{}</td>",
                    row.pages_served.map(format_count).unwrap_or_default()
                );
            }
            let _ = write!(
                out,
                "<td>{}</td><td>{}</td><td>{}</td></tr>",
                format_count(row.cache_hits),
                format_count(row.cache_misses),
                row.hit_ratio()
                    .map(|ratio| format_percent(ratio * 100.0))
                    .unwrap_or_else(|| "n/a".to_string())
            );
        }
        out.push_str("</tbody></table>");
        out
    }
}

fn form_html(form: &FormState) -> String {
    let mut options = String::new();
    for period in Period::iter() {
        let selected = if period == form.period { " selected" } else { "" };
        let _ = write!(options, "<option value=\"{period}\"{selected}>{period}</option>");
    }
    format!(
        "<form method=\"get\" action=\"/\">\
         <label>Site name<input name=\"site\" value=\"{}\" placeholder=\"my-site\" required></label>\
         <label>Environment<input name=\"env\" value=\"{}\" placeholder=\"live\" required></label>\
         <label>Period<select name=\"period\">{options}</select></label>\
         <button type=\"submit\">Get Metrics</button></form>",
        escape_html(&form.site),
        escape_html(&form.environment),
    )
}

fn error_section(err: &MetricsError) -> String {
    let detail = match err {
        MetricsError::ToolExecution { exit_code, stderr } => format!(
            "<p>terminus exited with status {exit_code}.</p><pre>{}</pre>",
            escape_html(stderr)
        ),
        other => format!("<p>{}</p>", escape_html(&other.to_string())),
    };
    format!("<section class=\"error\"><h2>Error</h2>{detail}</section>")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><meta name=\"viewport\" \
         content=\"width=device-width, initial-scale=1\"><title>{}</title><style>{STYLE}</style></head>\
         <body><main>{body}</main></body></html>",
        escape_html(title)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parse_metrics,
        MetricsRequest,
        RawOutput,
    };
    use pretty_assertions::assert_eq;

    const OUT: &str = "Period,Visits,Pages Served,Cache Hits,Cache Misses,Cache Hit Ratio\n\
                       2024-01-01,10,10,8,2,80%\n\
                       2024-01-02,5,5,4,1,80%\n";

    fn presenter() -> Presenter {
        Presenter::new(&terminus_metrics_config::Config::default().dashboard)
    }

    fn form() -> FormState {
        FormState {
            site: "acme".to_string(),
            environment: "live".to_string(),
            period: Period::Week,
        }
    }

    fn report(raw: RawOutput) -> MetricsReport {
        let outcome = raw.clone().ensure_success().and_then(|raw| parse_metrics(&raw.stdout));
        MetricsReport {
            request: MetricsRequest::new("acme", "live", Period::Day).unwrap(),
            raw: Some(raw),
            outcome,
        }
    }

    #[test]
    fn empty_form() {
        let html = presenter().dashboard_page(&form(), View::Form);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Get Metrics"));
        assert!(html.contains("<option value=\"week\" selected>week</option>"));
        assert!(html.contains("value=\"acme\""));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn full_report() {
        let html = presenter().dashboard_page(&form(), View::Report(&report(RawOutput::success(OUT))));
        assert!(html.contains("<h2>Summary</h2>"));
        assert!(html.contains("class=\"gauge\""));
        assert_eq!(html.matches("class=\"chart\"").count(), 2);
        assert!(html.contains("/metrics.csv?site=acme&amp;env=live&amp;period=day"));
        assert!(html.contains("download=\"acme_live_metrics.csv\""));
        // raw output has its dates reformatted
        assert!(html.contains("01-02-2024,5,5,4,1,80%"));
        assert!(html.contains("at or above the 70% target"));
    }

    #[test]
    fn tool_failure_shows_stderr_verbatim() {
        let raw = RawOutput {
            stdout: String::new(),
            stderr: "[error] You are not logged in. <run terminus auth:login>".to_string(),
            exit_code: 1,
        };
        let html = presenter().dashboard_page(&form(), View::Report(&report(raw)));
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("terminus exited with status 1."));
        assert!(html.contains("You are not logged in. &lt;run terminus auth:login&gt;"));
        assert!(!html.contains("<h2>Summary</h2>"));
    }

    #[test]
    fn empty_output_shows_no_data() {
        let empty = report(RawOutput::success(""));
        assert!(matches!(empty.outcome, Err(MetricsError::Parse(_))));
        let html = presenter().dashboard_page(&form(), View::Report(&empty));
        assert!(html.contains("class=\"error\""));
        assert!(html.contains("<h2>No data</h2>"));
        assert!(!html.contains("class=\"chart\""));
        assert!(!html.contains("Raw terminus output"));
    }

    #[test]
    fn rejected_input_is_escaped() {
        let err = MetricsError::InvalidRequest("site must not contain '<'".to_string());
        let html = presenter().dashboard_page(&form(), View::Rejected(&err));
        assert!(html.contains("site must not contain &#39;&lt;&#39;"));
    }

    #[test]
    fn deprecation_notices_are_not_warnings() {
        let raw = RawOutput {
            stdout: OUT.to_string(),
            stderr: "Deprecated: something in php\n[warning] Datapoints were capped\n".to_string(),
            exit_code: 0,
        };
        let html = presenter().dashboard_page(&form(), View::Report(&report(raw)));
        assert!(html.contains("Datapoints were capped"));
        assert!(!html.contains("Deprecated"));
    }

    #[test]
    fn sites_page() {
        let sites = vec![Site {
            name: "acme".to_string(),
            plan: "Performance Large".to_string(),
            fields: Vec::new(),
        }];
        let plans = vec!["Performance Large".to_string()];
        let html = presenter().sites_page(Ok(sites.as_slice()), &plans);
        assert!(html.contains("<td>acme</td><td>Performance Large</td>"));
        assert!(html.contains("href=\"/?site=acme&amp;env=live\""));

        let html = presenter().sites_page(Ok(&[][..]), &plans);
        assert!(html.contains("No sites matched."));
    }
}
