use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match docflow::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("docflow: {e}");
            ExitCode::FAILURE
        }
    }
}
