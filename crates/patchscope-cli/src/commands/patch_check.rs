use crate::config::{OutputFormat, Settings};
use crate::support::{emit_json, exit_with, load_pool_or_exit};
use patchscope_kernel::patch_check;
use serde_json::json;

pub fn run(settings: &Settings, updatestack_only: bool, repos: Vec<String>) {
    let pool = load_pool_or_exit(settings, &repos);
    let check = patch_check(&pool, updatestack_only);
    let result = check.result_code();

    match settings.output_without_xml() {
        OutputFormat::Json => emit_json(&json!({
            "action": "patch-check",
            "snapshotRef": pool.snapshot_ref(),
            "updatestackOnly": updatestack_only,
            "counts": check,
            "result": result,
            "exitCode": result.exit_code()
        })),
        _ => {
            println!("{}", check.needed_message());
            if let Some(locked) = check.locked_message() {
                println!("{locked}");
            }
        }
    }

    exit_with(result);
}
