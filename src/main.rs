use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    irview::cli::run().await
}
