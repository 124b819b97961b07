// asksql - plain english questions, read-only sql answers

use asksql::{cli, first_line};

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("error: {}", first_line(&e.to_string()));
        std::process::exit(1);
    }
}
