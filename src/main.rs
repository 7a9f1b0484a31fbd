// medquery - ask medical datasets questions in plain english

use medquery::cli;

#[tokio::main]
async fn main() {
    // a missing .env is fine, the environment may already be set
    dotenvy::dotenv().ok();

    if let Err(e) = cli::run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
