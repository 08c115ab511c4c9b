//! taskhub init command implementation.

use std::path::PathBuf;

use crate::cli::Context;
use crate::config::Config;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

pub struct InitOptions {
    pub data_dir: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitOutput {
    root: PathBuf,
    created: bool,
}

pub fn run_init(options: InitOptions) -> Result<()> {
    let ctx = Context::load(options.data_dir)?;
    let already = ctx.store.is_initialized();

    ctx.store.init_all()?;

    // Seed a config file so the invite token and defaults are discoverable
    let config_path = ctx.store.config_file();
    if !config_path.exists() {
        Config::default().save(&config_path)?;
    }

    let output = InitOutput {
        root: ctx.store.root().to_path_buf(),
        created: !already,
    };

    let mut human = HumanOutput::new(if already {
        "taskhub already initialized"
    } else {
        "taskhub initialized"
    });
    human.push_summary("Root", output.root.display().to_string());
    if !already {
        human.push_next_step("taskhub user add <name> <email> --invite <token>".to_string());
        human.push_next_step("taskhub task new <title> --user <admin>".to_string());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &output,
        Some(&human),
    )
}
