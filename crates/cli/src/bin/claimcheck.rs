use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    claimcheck_cli::main_entry().await
}
