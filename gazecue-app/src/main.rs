mod app;
mod cli;

use app::App;
use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let setup = cli.into_setup()?;
    App::new(setup)?.run()
}
