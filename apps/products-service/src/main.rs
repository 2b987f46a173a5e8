//! Products Service
//!
//! Binary entry point for the NATS message-pattern products service.

#[tokio::main]
async fn main() {
    if let Err(e) = products_service::run().await {
        eprintln!("Fatal error: {:?}", e);
        std::process::exit(1);
    }
}
