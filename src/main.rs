#[tokio::main]
async fn main() -> anyhow::Result<()> {
    trip_planner::run().await
}
