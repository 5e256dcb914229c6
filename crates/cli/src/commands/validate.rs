use std::path::Path;
use std::process;

use surveyflow_core::{validate_with, FindingSeverity, ValidationReport};

use crate::config::CliConfig;
use crate::input::read_survey;
use crate::{print_json, report_error, OutputFormat};

pub(crate) fn cmd_validate(survey_path: &Path, config: &CliConfig, output: OutputFormat, quiet: bool) {
    let survey = match read_survey(survey_path) {
        Ok(s) => s,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let report = validate_with(&survey, config.engine.validator_options());

    match output {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => print_report(&report, quiet),
    }

    if !report.is_ok() {
        process::exit(1);
    }
}

pub(crate) fn print_report(report: &ValidationReport, quiet: bool) {
    println!(
        "survey {}: {} ({} questions, {} edges, {} terminal candidates)",
        report.survey,
        report.outcome,
        report.question_count,
        report.edge_count,
        report.terminal_candidates.len()
    );
    if quiet {
        return;
    }
    for finding in &report.findings {
        let level = match finding.severity {
            FindingSeverity::Info => "info",
            FindingSeverity::Warning => "warning",
        };
        println!("  {}: {}", level, finding.message);
    }
}
