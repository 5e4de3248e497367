#[tokio::main]
async fn main() {
    if let Err(e) = askdb::run().await {
        eprintln!("askdb: {e}");
        std::process::exit(1);
    }
}
