//! CLI probe: load a mods directory through `modkit_core` and summarize it.
//!
//! Usage: `modkit_cli <mods_dir>`. Logging starts when `MODKIT_LOG_DIR` is
//! set (level from `MODKIT_LOG_LEVEL`, build default otherwise).

use modkit_core::{
    core_version, default_log_level, init_logging, LoaderConfig, ModLoader, Registry,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let Some(root) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: modkit_cli <mods_dir>");
        return ExitCode::from(2);
    };

    if let Ok(log_dir) = std::env::var("MODKIT_LOG_DIR") {
        let level = std::env::var("MODKIT_LOG_LEVEL")
            .unwrap_or_else(|_| default_log_level().to_string());
        if let Err(err) = init_logging(&level, &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("modkit_core version={}", core_version());

    let mut mods = Registry::new();
    let mut content = Registry::new();
    let report = match ModLoader::new(LoaderConfig::default()).load_all(&root, &mut mods, &mut content)
    {
        Ok(report) => report,
        Err(err) => {
            eprintln!("cannot read mods directory: {err}");
            log::error!("event=cli_load module=cli status=error error={err}");
            return ExitCode::FAILURE;
        }
    };

    for name in &report.loaded {
        if let Ok(manifest) = mods.get(name) {
            println!("loaded {name} ({})", manifest.title());
        }
    }
    for (dir, err) in &report.failed {
        println!("failed {}: {err}", dir.display());
    }
    println!("content entries={}", content.len());

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
