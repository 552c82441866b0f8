use std::process;

use anyhow::Result;
use clap::Parser;
use serpatlas::config::{self, AtlasSettings};
use serpatlas::{Prompter, Session};

#[derive(Parser, Debug)]
#[command(
    name = "serpatlas-explore",
    about = "Explore nearest-neighbor clusters of a mapped search-result dataset"
)]
struct ExploreCli {
    #[command(flatten)]
    atlas: AtlasSettings,
}

fn main() {
    config::init_tracing();
    config::load_dotenv();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = ExploreCli::parse();
    let client = cli.atlas.client()?;
    let mut session = Session::new(&client, Prompter::stdio());
    session.run()
}
