use clap::Parser;

mod cli;
mod config;
mod log;

use cli::app::App;

fn main() -> anyhow::Result<()> {
    let app = App::parse();
    log::init(app.verbose);
    cli::run(app)
}
