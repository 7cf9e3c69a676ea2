//! podrun CLI
//!
//! Runs one shell command inside a Kubernetes container and exits with
//! the remote process's exit code. Stdout of the remote command is not
//! collected; this is a fire-and-report tool, not an interactive shell.

use clap::Parser;
use color_eyre::Result;
use kube::config::KubeConfigOptions;
use kube::{Client, Config};
use tracing::debug;

#[derive(Parser)]
#[command(name = "podrun")]
#[command(about = "Run a shell command inside a Kubernetes container", long_about = None)]
struct Cli {
    /// Namespace the pod lives in
    #[arg(short = 'n', long, default_value = "default")]
    namespace: String,

    /// Container within the pod
    #[arg(short = 'c', long)]
    container: String,

    /// Kubeconfig context to use (defaults to the current one)
    #[arg(long)]
    context: Option<String>,

    /// Pod name
    pod: String,

    /// Command to run, after `--`
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let client = match &cli.context {
        Some(context) => {
            let options = KubeConfigOptions {
                context: Some(context.clone()),
                ..Default::default()
            };
            let config = Config::from_kubeconfig(&options).await?;
            Client::try_from(config)?
        }
        None => Client::try_default().await?,
    };

    let payload = shell_payload(&cli.command.join(" "));
    debug!(namespace = %cli.namespace, pod = %cli.pod, container = %cli.container, "running command");

    let code =
        podrun_exec::run_command(client, &cli.namespace, &cli.pod, &cli.container, &payload)
            .await?;

    std::process::exit(code);
}

/// Wrap a user command into a payload the executor accepts: newline
/// terminated, ending the remote shell with the command's own status
fn shell_payload(command: &str) -> String {
    format!("{command}\nexit $?\n")
}
