use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("atopflux version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
