use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    guest_client::run().await
}
