use clap::Parser;
use eyre::Result;
use stackrunner::{Cli, Context, RunnerConfig, dispatch, telemetry};
use stackrunner_events::TerminationLog;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    telemetry::init(cli.global.log_format);

    let termination_log = TerminationLog::new(&cli.global.termination_log);
    let result = match RunnerConfig::from_args(&cli.global) {
        Ok(config) => {
            let ctx = Context::from_env(config).await;
            dispatch(&ctx, cli.command).await
        }
        Err(e) => Err(e),
    };

    if let Err(err) = result {
        let message = format!("{err:#}");
        tracing::error!(error = %message, "stackrunner failed");
        termination_log.write(&message).await;
        return Err(err);
    }
    Ok(())
}
