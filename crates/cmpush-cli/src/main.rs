//! helm cm-push - push chart packages to ChartMuseum
//!
//! Also serves as Helm's downloader for `cm://` URLs.

use clap::Parser;
use cmpush_repo::ProcessEnvironment;
use miette::Result;

mod commands;
mod error;
mod logging;

const LONG_ABOUT: &str = "Helm plugin to push chart package to ChartMuseum

Examples:

  $ helm cm-push mychart-0.1.0.tgz chartmuseum       # push .tgz from \"helm package\"
  $ helm cm-push . chartmuseum                       # package and push chart directory
  $ helm cm-push . --version=\"7c4d121\" chartmuseum   # override version in Chart.yaml
  $ helm cm-push . https://my.chart.repo.com         # push directly to chart repo URL";

#[derive(Parser)]
#[command(name = "helm cm-push")]
#[command(author = "cmpush Contributors")]
#[command(about = "Helm plugin to push chart package to ChartMuseum", long_about = LONG_ABOUT)]
struct Cli {
    /// <chart> <repository>, or <certFile> <keyFile> <caFile> <cm://url> when called by Helm
    #[arg(value_name = "ARGS")]
    args: Vec<String>,

    #[command(flatten)]
    flags: commands::PushFlags,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help goes to stdout with status 0; flag errors exit 1 like every other failure
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    };

    logging::init(cli.debug);

    let env = ProcessEnvironment;
    let mut stdout = std::io::stdout();
    commands::run(&cli.args, cli.flags, &env, &mut stdout).await?;
    Ok(())
}
