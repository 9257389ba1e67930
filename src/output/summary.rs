use std::fmt::Write;

use comfy_table::Cell;
use serde_json::Value;

use crate::report::{PipelineStatus, StageLog, SummaryOutcome};

use super::styling::{bright, bright_red, cyan, dim, status_text};
use super::tables::{create_table, format_duration, format_millis, header_cells, status_cell};

/// Prints the run header and one table row per stage to stdout.
pub fn print_status(status: &PipelineStatus) {
    println!("{}", render_status(status));
}

/// Prints the log lookup result: the summary when there is one, otherwise
/// the console link or the raw log.
pub fn print_stage_log(log: &StageLog) {
    println!("{}", render_stage_log(log));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn stage_str<'a>(stage: &'a Value, key: &str) -> Option<&'a str> {
    stage.get(key).and_then(Value::as_str)
}

fn stage_millis(stage: &Value, key: &str) -> Option<i64> {
    stage.get(key).and_then(Value::as_i64)
}

fn render_status(status: &PipelineStatus) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Last completed run");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Pipeline:"),
        cyan(&status.pipeline_name),
        dim("Build:"),
        cyan(format!("#{}", status.build_number)),
        dim("Status:"),
        status_text(status.status.as_deref().unwrap_or("UNKNOWN")),
        dim("Started:"),
        format_millis(status.start_time_millis),
        dim("Finished:"),
        format_millis(status.end_time_millis),
    );

    add_section_header(&mut output, "🧱", "Stages");
    if status.stages.is_empty() {
        let _ = writeln!(output, "  {}", dim("No stages reported."));
        return output;
    }

    let mut table = create_table();
    table.set_header(header_cells(&["Node", "Stage", "Status", "Started", "Duration"]));
    for stage in &status.stages {
        table.add_row(vec![
            Cell::new(stage_str(stage, "id").unwrap_or("-")),
            Cell::new(stage_str(stage, "name").unwrap_or("-")),
            status_cell(stage_str(stage, "status")),
            Cell::new(format_millis(stage_millis(stage, "startTimeMillis"))),
            Cell::new(format_duration(stage_millis(stage, "durationMillis"))),
        ]);
    }
    let _ = writeln!(output, "{table}");
    output
}

fn render_stage_log(log: &StageLog) -> String {
    let mut output = String::new();

    match log {
        StageLog::DownstreamConsole {
            downstream_console_url,
        } => {
            add_section_header(&mut output, "🔗", "Console");
            let _ = writeln!(
                output,
                "  {}\n  {}",
                dim("The node log is unavailable; open the console instead:"),
                cyan(downstream_console_url)
            );
        }
        StageLog::Log { log, summary: None } => {
            add_section_header(&mut output, "📜", "Log");
            let _ = writeln!(
                output,
                "  {}",
                dim(format!("{} lines, nothing to summarise", log.lines().count()))
            );
        }
        StageLog::Log {
            summary: Some(SummaryOutcome::Summary(result)),
            ..
        } => {
            add_section_header(&mut output, "🧠", "Failure summary");
            let _ = writeln!(output, "{}\n", result.summary.trim_end());
            if !result.document_ids.is_empty() {
                add_section_header(&mut output, "📎", "Related documents");
                for id in &result.document_ids {
                    let _ = writeln!(output, "  - {}", cyan(id));
                }
            }
        }
        StageLog::Log {
            log,
            summary: Some(SummaryOutcome::Failed { error }),
        } => {
            add_section_header(&mut output, "⚠️", "Summary unavailable");
            let _ = writeln!(output, "  {}\n", bright_red(error));
            add_section_header(&mut output, "📜", "Log");
            let _ = writeln!(output, "{log}");
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::SummaryResult;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn plain(text: &str) -> String {
        console::strip_ansi_codes(text).into_owned()
    }

    #[test]
    fn status_lists_every_stage() {
        let status = PipelineStatus {
            pipeline_name: "promotion".to_string(),
            build_number: "42".to_string(),
            stages: vec![
                json!({"id": "6", "name": "Build", "status": "SUCCESS", "durationMillis": 1500}),
                json!({"id": "9", "name": "Test", "status": "FAILED"}),
            ],
            status: Some("FAILED".to_string()),
            start_time_millis: Some(0),
            end_time_millis: None,
        };

        let rendered = plain(&render_status(&status));

        assert!(rendered.contains("#42"));
        assert!(rendered.contains("1970-01-01 00:00:00 UTC"));
        assert!(rendered.contains("Build"));
        assert!(rendered.contains("1.5s"));
        assert!(rendered.contains("Test"));
    }

    #[test]
    fn status_without_stages_says_so() {
        let status = PipelineStatus {
            pipeline_name: "promotion".to_string(),
            build_number: "1".to_string(),
            stages: Vec::new(),
            status: None,
            start_time_millis: None,
            end_time_millis: None,
        };
        assert!(plain(&render_status(&status)).contains("No stages reported."));
    }

    #[test]
    fn summary_lists_documents() {
        let log = StageLog::Log {
            log: "boom".to_string(),
            summary: Some(SummaryOutcome::Summary(SummaryResult {
                summary: "- test_x: expected 1, got 2".to_string(),
                document_ids: BTreeSet::from(["JIRA-7".to_string()]),
            })),
        };

        let rendered = plain(&render_stage_log(&log));

        assert!(rendered.contains("- test_x: expected 1, got 2"));
        assert!(rendered.contains("- JIRA-7"));
        assert!(!rendered.contains("boom"));
    }

    #[test]
    fn failed_summary_falls_back_to_log() {
        let log = StageLog::Log {
            log: "ERROR: boom".to_string(),
            summary: Some(SummaryOutcome::Failed {
                error: "Summarization request failed with status 500: ".to_string(),
            }),
        };

        let rendered = plain(&render_stage_log(&log));

        assert!(rendered.contains("status 500"));
        assert!(rendered.contains("ERROR: boom"));
    }
}
