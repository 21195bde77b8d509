use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    inbox_transcript::cli::run().await
}
