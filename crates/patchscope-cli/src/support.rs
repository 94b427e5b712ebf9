use patchscope_kernel::{KernelError, ResultCode};
use patchscope_pool::Pool;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::cli::GlobalArgs;
use crate::config::{CONFIG_ENV, Settings, load_file_config};

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn settings_or_exit(global: &GlobalArgs) -> Settings {
    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: failed to resolve working directory: {e}");
        std::process::exit(1);
    });
    let env_path = std::env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(std::path::PathBuf::from);
    let file = load_file_config(env_path, &cwd).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let settings = Settings::resolve(global, file);
    tracing::debug!(
        pool = %settings.pool.display(),
        config = ?settings.config_path,
        "settings resolved"
    );
    settings
}

/// Load the pool, keeping only the given repositories when any are named.
pub fn load_pool_or_exit(settings: &Settings, repos: &[String]) -> Pool {
    let path = &settings.pool;
    let mut pool = Pool::load_jsonl(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(1);
    });
    if !repos.is_empty() {
        pool.restrict_to_repos(repos).unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });
    }
    pool
}

/// Unwrap a kernel or collaborator result, exiting on failure.
pub fn kernel_or_exit<T, E: Into<KernelError>>(result: Result<T, E>) -> T {
    result.map_err(Into::into).unwrap_or_else(|e: KernelError| {
        eprintln!("error: {e}");
        std::process::exit(ResultCode::Failure.exit_code());
    })
}

pub fn emit_json(payload: &Value) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: json serialization failed: {e}");
        std::process::exit(1);
    });
    println!("{rendered}");
}

/// Exit with the status of `code`; returns normally for `Ok`.
pub fn exit_with(code: ResultCode) {
    if code != ResultCode::Ok {
        std::process::exit(code.exit_code());
    }
}
