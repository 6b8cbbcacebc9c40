#[tokio::main]
async fn main() -> anyhow::Result<()> {
    request_authz::server::run().await
}
