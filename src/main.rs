#[tokio::main]
async fn main() {
    // Run the CLI
    smart_toc::cli::run().await;
}
