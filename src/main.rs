use anyhow::Result;
use flow_viewer::app::{self, Options};

fn main() -> Result<()> {
    let options = Options::parse(std::env::args().skip(1));
    app::run(options)
}
