use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = server::start_server().await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}
