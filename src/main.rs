use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    sealgate_cli::cli::app::run().await
}
