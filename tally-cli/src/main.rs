use anyhow::Result;

fn main() -> Result<()> {
    tally_cli::app::run()
}
