//! Footers and hidden markers appended to created content.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use safeout_config::MessageTemplates;
use safeout_policy::sanitize::sanitize_body_within;
use safeout_primitives::RunContext;

/// Footer used when the configuration does not set one.
pub const DEFAULT_FOOTER: &str = "> AI generated by [{{workflow_name}}]({{run_url}})";

const MARKER_PREFIX: &str = "<!-- safe-outputs-workflow: ";
const EXPIRES_PREFIX: &str = "<!-- safe-outputs-expires-on: ";
const GROUP_PREFIX: &str = "<!-- safe-outputs-group: ";

/// Renders footers and markers for one run.
#[derive(Debug, Clone)]
pub struct MessageRenderer {
    footer: String,
    marker: String,
    group_marker: String,
    workflow_name: String,
    variables: HashMap<&'static str, String>,
}

impl MessageRenderer {
    /// Binds the templates to the run.
    #[must_use]
    pub fn new(run: &RunContext, templates: &MessageTemplates) -> Self {
        let workflow_name = run.workflow_name().unwrap_or("workflow").to_owned();
        let marker_id = marker_id(run.workflow_name().unwrap_or("safe-outputs"));

        let variables = HashMap::from([
            ("workflow_name", workflow_name.clone()),
            ("run_url", run.run_url()),
            ("run_id", run.run_id().to_string()),
            ("repository", run.repository().to_string()),
        ]);

        Self {
            footer: templates
                .footer
                .clone()
                .unwrap_or_else(|| DEFAULT_FOOTER.to_owned()),
            marker: format!("{MARKER_PREFIX}{marker_id} -->"),
            group_marker: format!("{GROUP_PREFIX}{marker_id} -->"),
            workflow_name,
            variables,
        }
    }

    /// Hidden marker identifying content written by this workflow.
    #[must_use]
    pub fn workflow_marker(&self) -> &str {
        &self.marker
    }

    /// Hidden marker identifying this workflow's parent issue for grouping.
    #[must_use]
    pub fn group_marker(&self) -> &str {
        &self.group_marker
    }

    /// Display name of the workflow.
    #[must_use]
    pub fn workflow_name(&self) -> &str {
        &self.workflow_name
    }

    /// Rendered footer text.
    #[must_use]
    pub fn footer(&self) -> String {
        render_template(&self.footer, &self.variables)
    }

    /// Sanitizes an agent-authored body and appends the footer and marker.
    ///
    /// The footer and marker count against the body length limit, so a long
    /// body is truncated early enough for both to survive.
    #[must_use]
    pub fn decorate(&self, body: &str) -> String {
        self.decorate_with(body, &[])
    }

    /// [`decorate`](Self::decorate) plus extra hidden markers, one per line
    /// after the workflow marker, also counted against the limit.
    #[must_use]
    pub fn decorate_with(&self, body: &str, markers: &[String]) -> String {
        let mut suffix = format!("\n\n{}\n\n{}", self.footer(), self.marker);
        for marker in markers {
            suffix.push('\n');
            suffix.push_str(marker);
        }
        let mut decorated = sanitize_body_within(body, suffix.chars().count());
        decorated.push_str(&suffix);
        decorated
    }
}

/// Hidden marker carrying an expiry date.
#[must_use]
pub fn expires_marker(at: DateTime<Utc>) -> String {
    format!(
        "{EXPIRES_PREFIX}{} -->",
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Substitutes `{{name}}` placeholders. Unknown names render empty.
#[must_use]
pub fn render_template(template: &str, variables: &HashMap<&'static str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = after[..end].trim();
        if let Some(value) = variables.get(name) {
            out.push_str(value);
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}

fn marker_id(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use safeout_policy::sanitize::MAX_BODY_CHARS;
    use safeout_primitives::{Repository, RunId};

    use super::*;

    fn run() -> RunContext {
        RunContext::new(Repository::new("octo", "repo"), RunId::new("42"))
            .with_workflow_name("Weekly Triage")
    }

    #[test]
    fn default_footer_links_the_run() {
        let renderer = MessageRenderer::new(&run(), &MessageTemplates::default());
        assert_eq!(
            renderer.footer(),
            "> AI generated by [Weekly Triage](https://github.com/octo/repo/actions/runs/42)"
        );
        assert_eq!(
            renderer.workflow_marker(),
            "<!-- safe-outputs-workflow: weekly-triage -->"
        );
    }

    #[test]
    fn custom_footer_and_unknown_variables() {
        let templates = MessageTemplates {
            footer: Some("_{{ workflow_name }} run {{run_id}}{{missing}}_".to_owned()),
            ..MessageTemplates::default()
        };
        let renderer = MessageRenderer::new(&run(), &templates);
        assert_eq!(renderer.footer(), "_Weekly Triage run 42_");
    }

    #[test]
    fn decorate_sanitizes_and_marks() {
        let renderer = MessageRenderer::new(&run(), &MessageTemplates::default());
        let body = renderer.decorate("ping @octocat");
        assert!(body.starts_with("ping `@octocat`\n\n> AI generated by"));
        assert!(body.ends_with(renderer.workflow_marker()));
    }

    #[test]
    fn decorated_long_body_fits_the_limit() {
        let renderer = MessageRenderer::new(&run(), &MessageTemplates::default());
        let body = renderer.decorate(&"z".repeat(MAX_BODY_CHARS + 500));

        assert_eq!(body.chars().count(), MAX_BODY_CHARS);
        assert!(body.contains("[Content truncated due to length]"));
        assert!(body.contains("> AI generated by [Weekly Triage]"));
        assert!(body.ends_with(renderer.workflow_marker()));

        let expiry = expires_marker(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let body = renderer.decorate_with(&"z".repeat(MAX_BODY_CHARS), &[expiry.clone()]);
        assert_eq!(body.chars().count(), MAX_BODY_CHARS);
        assert!(body.ends_with(&format!("{}\n{expiry}", renderer.workflow_marker())));
    }

    #[test]
    fn unterminated_placeholder_is_kept() {
        let vars = HashMap::from([("a", "x".to_owned())]);
        assert_eq!(render_template("{{a}} and {{b", &vars), "x and {{b");
    }

    #[test]
    fn expiry_marker_is_rfc3339() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(
            expires_marker(at),
            "<!-- safe-outputs-expires-on: 2026-03-01T12:00:00Z -->"
        );
    }
}
