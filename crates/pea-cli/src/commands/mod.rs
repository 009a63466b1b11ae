//! Command implementations and dispatch logic.
//!
//! Each command is implemented as an async function that takes a CommandContext.

use camino::Utf8PathBuf;
use pea_config::{ConfigLayering, ConfigLoader, PeaToml};
use pea_core::error::{PeaError, PeaResult};
use tracing::{debug, info};

pub mod aliases;
pub mod check;

#[cfg(test)]
mod tests;

pub use aliases::AliasesArgs;

use crate::{output::OutputHandler, Commands};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
}

impl CommandContext {
    /// Create a new command context
    pub fn new() -> PeaResult<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| PeaError::io("Failed to get current directory".to_string(), e))?;
        let cwd = Utf8PathBuf::from_path_buf(cwd).map_err(|path| {
            PeaError::config("cwd", format!("Current directory {} is not valid UTF-8", path.display()))
        })?;

        Ok(Self {
            cwd,
            output: OutputHandler::new(),
        })
    }

    /// Resolve a user-supplied path against the working directory
    pub fn resolve_path(&self, path: &Utf8PathBuf) -> Utf8PathBuf {
        if path.is_absolute() {
            path.clone()
        } else {
            self.cwd.join(path)
        }
    }

    /// Load the layered configuration: global, project, environment, then `cli_overrides`
    pub async fn load_config(&self, cli_overrides: &[(&str, String)]) -> PeaResult<PeaToml> {
        let loader = ConfigLoader::new(self.cwd.clone());
        let (project, source) = loader.load_project_config().await?;
        let global = loader.load_global_config().await?.map(|(config, _)| config);
        debug!("Project configuration source: {:?}", source);

        let mut layering = ConfigLayering::new(project)
            .with_global(global)
            .with_env_overrides(ConfigLayering::collect_env_overrides());
        for (key, value) in cli_overrides {
            layering = layering.with_cli_override(*key, value.clone());
        }
        layering.resolve()
    }
}

/// Dispatch a command to its handler
pub async fn dispatch_command(command: Commands, ctx: &CommandContext) -> PeaResult<()> {
    match command {
        Commands::Aliases(args) => {
            info!("Applying module aliases from {}", args.snapshot);
            aliases::execute(args, ctx).await
        }
        Commands::Check => {
            info!("Checking configuration");
            check::execute(ctx).await
        }
        Commands::Version => {
            info!("Showing version information");
            show_version(ctx)
        }
    }
}

fn show_version(ctx: &CommandContext) -> PeaResult<()> {
    let version = env!("CARGO_PKG_VERSION");
    let build_date = env!("BUILD_DATE");
    let target = format!("{}-{}", std::env::consts::ARCH, std::env::consts::OS);

    ctx.output.info(&format!("Pea v{}", version));
    ctx.output.info(&format!("Built: {}", build_date));
    ctx.output.info(&format!("Target: {}", target));
    ctx.output.info(&format!("Rust: {}", env!("RUSTC_VERSION")));

    Ok(())
}
