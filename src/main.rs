#[tokio::main]
async fn main() -> anyhow::Result<()> {
    camcorder_lib::run().await
}
