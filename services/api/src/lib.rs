mod cli;
mod infra;
mod pipeline;
mod routes;
mod server;

use decision_match::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
