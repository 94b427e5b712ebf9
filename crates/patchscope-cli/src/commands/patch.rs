use crate::cli::{IssueArgs, PatchFilterArgs};
use crate::commands::list_patches::warning_messages;
use crate::config::{OutputFormat, Settings};
use crate::support::{emit_json, exit_with, kernel_or_exit, load_pool_or_exit};
use patchscope_kernel::{
    RequestFeedback, RequestOptions, mark_patch_updates, mark_updates_by_issue,
};
use serde_json::{Value, json};

pub struct Args {
    pub issues: IssueArgs,
    pub filter: PatchFilterArgs,
    pub force: bool,
    pub skip_interactive: bool,
    pub updatestack_only: bool,
    pub repos: Vec<String>,
}

pub fn run(settings: &Settings, args: Args) {
    let (issues, warnings) = args.issues.scan();
    let pool = load_pool_or_exit(settings, &args.repos);
    let options = RequestOptions {
        force: args.force || settings.force,
        skip_interactive: args.skip_interactive || settings.skip_interactive,
        filter: args.filter.to_filter(),
    };
    let mut resolver = pool.resolver();
    let json_output = settings.output_without_xml() == OutputFormat::Json;

    if issues.is_empty() {
        let run = kernel_or_exit(mark_patch_updates(
            &pool,
            &mut resolver,
            &options,
            args.updatestack_only,
        ));
        if json_output {
            emit_json(&json!({
                "action": "patch",
                "snapshotRef": pool.snapshot_ref(),
                "requested": run.requested,
                "feedback": feedback_messages(&run.feedback),
                "deferred": run.deferred,
                "result": run.result,
                "exitCode": run.result.exit_code()
            }));
        } else {
            for feedback in &run.feedback {
                println!("{}", feedback.message());
            }
            if run.deferred > 0 {
                println!(
                    "{} other {} will be marked once the software management updates are installed. Run this command again.",
                    run.deferred,
                    if run.deferred == 1 { "patch" } else { "patches" }
                );
            }
            if run.feedback.is_empty() {
                println!("Nothing to do.");
            }
        }
        exit_with(run.result);
        return;
    }

    let run = kernel_or_exit(mark_updates_by_issue(
        &pool,
        &mut resolver,
        &issues,
        &options,
    ));
    if json_output {
        let reports: Vec<Value> = run
            .reports
            .iter()
            .map(|report| {
                json!({
                    "issue": report.issue.to_string(),
                    "outcome": report.outcome,
                    "requested": report.requested,
                    "feedback": feedback_messages(&report.feedback),
                    "message": report.not_found_message()
                })
            })
            .collect();
        emit_json(&json!({
            "action": "patch",
            "snapshotRef": pool.snapshot_ref(),
            "warnings": warning_messages(&warnings),
            "reports": reports,
            "found": run.found().count(),
            "result": run.result,
            "exitCode": run.result.exit_code()
        }));
    } else {
        for report in &run.reports {
            for feedback in &report.feedback {
                println!("{}", feedback.message());
            }
            if let Some(message) = report.not_found_message() {
                println!("{message}");
            }
        }
    }
    exit_with(run.result);
}

fn feedback_messages(feedback: &[RequestFeedback]) -> Vec<String> {
    feedback.iter().map(RequestFeedback::message).collect()
}
