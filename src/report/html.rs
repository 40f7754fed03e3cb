use super::{write_file, Reporter};
use crate::config::RunConfig;
use crate::error::RunError;
use crate::runner::RunReport;
use minijinja::{context, Environment};
use std::path::PathBuf;
use tracing::info;

const TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>petstore-e2e report</title>
<style>
body { font-family: system-ui, sans-serif; margin: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #ddd; padding: .4rem; text-align: left; vertical-align: top; }
.passed { color: #1a7f37; } .flaky { color: #9a6700; } .failed { color: #cf222e; } .skipped { color: #57606a; }
pre { margin: 0; white-space: pre-wrap; }
</style>
</head>
<body>
<h1>petstore-e2e</h1>
<p>{{ report.base_url }} &middot; run {{ report.run_id }} &middot; {{ report.duration_ms }}ms &middot; {{ report.workers }} workers &middot; {{ report.retries }} retries</p>
<p>
  <span class="passed">{{ report.summary.passed }} passed</span>,
  <span class="flaky">{{ report.summary.flaky }} flaky</span>,
  <span class="failed">{{ report.summary.failed }} failed</span>,
  <span class="skipped">{{ report.summary.skipped }} skipped</span>
</p>
<table>
<tr><th>Case</th><th>Outcome</th><th>Attempts</th><th>Duration</th></tr>
{% for case in report.cases %}
<tr>
  <td>{{ case.title }}</td>
  <td class="{{ case.outcome }}">{{ case.outcome }}</td>
  <td>
  {% for attempt in case.attempts %}
    <div>#{{ attempt.attempt }}: {% if attempt.passed %}passed{% else %}{{ attempt.error_kind }}{% endif %}
    {% if attempt.error %}<pre>{{ attempt.error }}</pre>{% endif %}
    {% if attempt.trace %}<div>trace: <code>{{ attempt.trace }}</code></div>{% endif %}
    </div>
  {% endfor %}
  </td>
  <td>{{ case.duration_ms }}ms</td>
</tr>
{% endfor %}
</table>
</body>
</html>
"#;

/// Renders `<output_dir>/report/index.html`.
pub struct HtmlReporter;

impl HtmlReporter {
    pub fn path(config: &RunConfig) -> PathBuf {
        config.output_dir.join("report").join("index.html")
    }

    pub fn render(report: &RunReport) -> Result<String, RunError> {
        let render_error = |err: minijinja::Error| RunError::Render {
            what: "html report",
            message: err.to_string(),
        };
        let mut env = Environment::new();
        env.add_template("index.html", TEMPLATE).map_err(render_error)?;
        env.get_template("index.html")
            .and_then(|tpl| tpl.render(context! { report => report }))
            .map_err(render_error)
    }
}

impl Reporter for HtmlReporter {
    fn on_end(&mut self, config: &RunConfig, report: &RunReport) -> Result<(), RunError> {
        let path = Self::path(config);
        let html = Self::render(report)?;
        write_file(&path, html.as_bytes())?;
        info!(path = %path.display(), "html report written");
        Ok(())
    }
}
