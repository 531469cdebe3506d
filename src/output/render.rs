use std::fmt::Write;

use comfy_table::{Attribute, Cell, Color as TableColor};

use crate::monitor::format::{duration, pretty_date, truncate};
use crate::monitor::{classify, humanize, Snapshot, StatusColor};
use crate::providers::circleci::{Build, Step, TestCase};

use super::styling::{bold, cyan, in_status_color};
use super::tables::{create_cyan_header, create_table, status_cell};

const LABEL_WIDTH: usize = 15;

fn push_line(output: &mut String, label: &str, value: &str, color: StatusColor) {
    let _ = writeln!(
        output,
        "{} {}",
        bold(format!("{label:<width$}", width = LABEL_WIDTH)),
        in_status_color(value, color)
    );
}

/// Renders the status view of one build.
///
/// Shows the commit subject, build status, start/finish times and compare
/// link, followed by a table of steps and a table of failing tests when
/// there are any. Every build line uses the color of the build status.
pub fn render_status(snapshot: &Snapshot) -> String {
    let mut output = String::new();
    let build = &snapshot.build;

    if let Some(subject) = &build.subject {
        let _ = writeln!(output, "{}\n", cyan(subject));
    }

    let color = classify(&build.status);
    let started =
        pretty_date(build.start_time.as_deref()).unwrap_or_else(|| "Not started".to_string());
    let finished =
        pretty_date(build.stop_time.as_deref()).unwrap_or_else(|| "Not finished".to_string());

    push_line(&mut output, "Build status", &humanize(&build.status), color);
    push_line(&mut output, "Started at", &started, color);
    push_line(&mut output, "Finished at", &finished, color);
    if let Some(compare) = &build.compare {
        push_line(&mut output, "Compare", compare, color);
    }

    if !snapshot.steps.is_empty() {
        output.push_str(&render_steps(&snapshot.steps));
    }

    if !snapshot.failing.is_empty() {
        output.push_str(&render_failures(&snapshot.failing));
    }

    output
}

fn render_steps(steps: &[Step]) -> String {
    let mut table = create_table();
    table.set_header(create_cyan_header(&["Step", "Time"]));

    for step in steps {
        let (status, runtime) = step.first_action().map_or(("", None), |action| {
            (action.status.as_str(), action.run_time_millis)
        });
        table.add_row(vec![
            status_cell(&step.name, status),
            Cell::new(runtime.map(duration).unwrap_or_default()),
        ]);
    }

    format!("\n{}\n{table}\n", bold("Steps:"))
}

fn render_failures(failures: &[TestCase]) -> String {
    let mut table = create_table();
    table.set_header(create_cyan_header(&["File", "Test"]));

    for test in failures {
        table.add_row(vec![
            Cell::new(test.file.as_deref().unwrap_or("")).fg(TableColor::Red),
            Cell::new(&test.name),
        ]);
    }

    format!("\n{}\n{table}\n", bold("Failing specs:"))
}

/// Renders recent builds across branches as a table.
pub fn render_overview(builds: &[Build]) -> String {
    let mut table = create_table();
    table.set_header(create_cyan_header(&["Branch", "Status", "Subject", "Started"]));

    for build in builds {
        table.add_row(vec![
            Cell::new(build.branch.as_deref().unwrap_or("")).add_attribute(Attribute::Bold),
            status_cell(humanize(&build.status), &build.status),
            Cell::new(truncate(build.subject.as_deref().unwrap_or(""))),
            Cell::new(pretty_date(build.start_time.as_deref()).unwrap_or_default()),
        ]);
    }

    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::circleci::Action;

    fn snapshot(build: Build) -> Snapshot {
        Snapshot {
            build,
            steps: vec![],
            failing: vec![],
        }
    }

    fn running_build() -> Build {
        Build {
            build_num: 7,
            subject: Some("Add widget sprockets".to_string()),
            status: "not_running".to_string(),
            ..Build::default()
        }
    }

    #[test]
    fn test_render_status_running_build() {
        let output = render_status(&snapshot(running_build()));

        assert!(output.contains("Add widget sprockets"));
        assert!(output.contains("Build status"));
        assert!(output.contains("Not running"));
        assert!(output.contains("Not started"));
        assert!(output.contains("Not finished"));
        assert!(!output.contains("Compare"));
        assert!(!output.contains("Steps:"));
        assert!(!output.contains("Failing specs:"));
    }

    #[test]
    fn test_render_status_bad_timestamp_shows_as_absent() {
        let mut build = running_build();
        build.start_time = Some("garbage".to_string());
        build.compare = Some("https://github.com/acme/widgets/compare/a...b".to_string());

        let output = render_status(&snapshot(build));
        assert!(output.contains("Not started"));
        assert!(output.contains("Compare"));
        assert!(output.contains("compare/a...b"));
    }

    #[test]
    fn test_render_status_steps_and_failures() {
        let mut snapshot = snapshot(running_build());
        snapshot.steps = vec![
            Step {
                name: "Checkout code".to_string(),
                actions: vec![Action {
                    status: "success".to_string(),
                    run_time_millis: Some(65_000),
                }],
            },
            Step {
                name: "Waiting".to_string(),
                actions: vec![],
            },
        ];
        snapshot.failing = vec![TestCase {
            file: Some("spec/widget_spec.rb".to_string()),
            name: "spins sprockets".to_string(),
            result: "failure".to_string(),
        }];

        let output = render_status(&snapshot);
        assert!(output.contains("Steps:"));
        assert!(output.contains("Checkout code"));
        assert!(output.contains("1m 5s"));
        assert!(output.contains("Waiting"));
        assert!(output.contains("Failing specs:"));
        assert!(output.contains("spec/widget_spec.rb"));
        assert!(output.contains("spins sprockets"));
    }

    #[test]
    fn test_render_overview_rows() {
        let mut build = running_build();
        build.branch = Some("feature/sprockets".to_string());
        build.status = "infrastructure_fail".to_string();
        build.subject = Some("s".repeat(80));

        let output = render_overview(&[build]);
        assert!(output.contains("feature/sprockets"));
        assert!(output.contains("Infrastructure fail"));
        assert!(output.contains("..."));
    }
}
