//! Submits a single document through a gate admitting 10 documents per minute.
use docgate::{DocumentClient, GateConfig, TimeUnit};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let client = DocumentClient::https(GateConfig::new(TimeUnit::Minutes, 10)?)?;
    let document = json!({ "doc_id": "123", "doc_status": "NEW" });

    match client.submit(&document).await {
        Ok(receipt) => println!("document created (status {}): {}", receipt.status, receipt.body),
        Err(e) => eprintln!("{}", e),
    }

    client.shutdown().await;
    Ok(())
}
