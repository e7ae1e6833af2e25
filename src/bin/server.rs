use clap::Parser;
use respgrid::config::Config;
use respgrid::{server, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::parse();

    server::run(config).await
}
