use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use page_ingest::config::lambda::{s3_client, S3Storage};
use page_ingest::utils::{logger, validation::Validate};
use page_ingest::{EtlEngine, HttpClient, IngestConfig};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// The trigger payload carries nothing the job needs; configuration comes from the environment.
async fn function_handler(_event: LambdaEvent<Value>) -> Result<Response, Error> {
    let config = IngestConfig::from_env()?;
    config.validate()?;

    let storage = S3Storage::new(s3_client(&config).await, config.bucket_name.clone());
    let source = HttpClient::new(config.http.clone())?;
    let summary = EtlEngine::new(source, storage, config).run().await?;

    let body = summary.response_body("OK")?;

    tracing::info!("Ingested {} rows", summary.total_rows);
    Ok(Response {
        status_code: 200,
        body,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();
    run(service_fn(function_handler)).await
}
