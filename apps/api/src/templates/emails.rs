//! Notification message bodies. Placeholders are `{field}` names resolved
//! from `TemplateContext`.

pub const SC_TEMPLATE: &str = r#"Hi {first_name} {last_name},

Good day!

As part of our commitment to support your growth and success, we are sharing with you your Performance Report Card for the month of {month} {year}.

This report provides a summary of your individual performance and achievements during the month, reflecting your progress against the department's goals and expectations. We encourage you to review the details and take note of both your strengths and the areas where improvements can be made.

Should you have any questions or would like to discuss your results further, feel free to reach out to your immediate supervisor.

View it here: {url}
"#;

pub const GRM_TEMPLATE: &str = r#"Hi {first_name} {last_name},

Good day!

The Performance Report Cards for {month} {year} are ready.

Your own dashboard: {url}

Report cards of the team members you manage:
{managed_links}

Please review them with your team and reach out to HR for any concerns.
"#;

pub const DEFAULT_TEMPLATE: &str = r#"Hello {first_name} {last_name},

Your latest report is ready.

View it here: {url}
"#;

pub const SUBJECT_PREFIX: &str = "Performance Report Card";

pub const TEST_SUBJECT: &str = "Test";

pub const TEST_BODY: &str = "Hello, World!\n";
