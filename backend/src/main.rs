#[tokio::main]
async fn main() -> anyhow::Result<()> {
    waitlist_server::start_server().await
}
