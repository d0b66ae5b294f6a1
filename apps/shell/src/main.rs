use anyhow::Context;
use clap::Parser;
use wf::domain::config::AppConfig;
use wf::kernel::config::load_config;
use wf::kernel::security::with_actor;
use wf_logger::Logger;
use wf_shell::{Cli, Command, Shell};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Cli { config, actor, seed, command } = Cli::parse();

    let cfg: AppConfig = load_config(config.as_deref()).context("Critical: Configuration is malformed")?;
    let _log = Logger::from_config(env!("CARGO_PKG_NAME"), &cfg.logging)?;

    let shell = Shell::builder().config(cfg).build().await?;

    let run = async {
        if seed && !matches!(command, Command::Seed) {
            shell.seed().await?;
        }
        shell.execute(command, &mut std::io::stdout().lock()).await
    };
    match actor {
        Some(actor) => with_actor(actor, run).await,
        None => run.await,
    }
}
