//! Binary entrypoint for the resource-tree tool

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    resource_tree::cli::run().await
}
