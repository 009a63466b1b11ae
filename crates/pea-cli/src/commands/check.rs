//! `pea check` command implementation.

use pea_core::error::PeaResult;

use super::CommandContext;

/// Execute the `pea check` command
pub async fn execute(ctx: &CommandContext) -> PeaResult<()> {
    let config = ctx.load_config(&[]).await?;
    let aliasing = config.aliasing();

    if let Some(name) = config.package_name() {
        ctx.output.info(&format!("Package: {}", name));
    }
    ctx.output.info(&format!("Primary language: {}", aliasing.primary_language));
    ctx.output.info(&format!("Deny conflicts: {}", aliasing.deny_conflicts));
    ctx.output.success("Configuration is valid");
    Ok(())
}
