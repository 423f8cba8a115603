//! Init command implementation

use serde_json::json;

use crate::cli::InitArgs;
use crate::config::{RtsConfig, CONFIG_FILE_NAME};
use crate::error::{Result, RtsError};

use super::{resolve_dir, CommandContext};

/// Write a default `rts.toml` into the project root
pub fn run_init(args: &InitArgs, ctx: &CommandContext) -> Result<String> {
    let project = resolve_dir(args.path.as_ref())?;
    let path = project.join(CONFIG_FILE_NAME);
    if path.exists() && !args.force {
        return Err(RtsError::ConfigError {
            message: format!("{} already exists (use --force to overwrite)", path.display()),
        });
    }
    RtsConfig::default().save_to(&path)?;

    let value = json!({ "_type": "init", "path": path.display().to_string() });
    ctx.render(&value, || format!("written: {}\n", path.display()))
}
