//! Pennywise command-line client with offline queueing.

#![forbid(unsafe_code)]

mod client_config;
mod command;

use std::sync::Arc;

use pennywise_application::{
    DispatchOptions, FlushReport, OfflineQueue, RequestDispatcher, subscribe_flush_on_reconnect,
};
use pennywise_core::{AppError, AppResult, SystemClock};
use pennywise_domain::{HttpMethod, OutboundRequest};
use pennywise_infrastructure::{
    JsonFileOfflineQueueStore, ReqwestHttpTransport, TracingSyncNotifier,
    WatchConnectivityMonitor,
};
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::client_config::{ClientConfig, init_tracing};
use crate::command::ClientCommand;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ClientConfig::load()?;
    let http_client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(|error| AppError::Internal(format!("failed to build HTTP client: {error}")))?;

    let health_url = config.health_url()?;
    let connectivity = Arc::new(WatchConnectivityMonitor::new(false));
    let online = connectivity
        .probe_once(&http_client, health_url.as_str(), config.probe_interval)
        .await;
    let probe = connectivity.spawn_probe(
        http_client.clone(),
        health_url,
        config.probe_interval,
    );

    let queue = OfflineQueue::load(
        Arc::new(JsonFileOfflineQueueStore::new(
            config.offline_queue_path.clone(),
        )),
        Arc::new(TracingSyncNotifier),
        Arc::new(SystemClock),
        connectivity.clone(),
    )
    .await?;
    let dispatcher = Arc::new(
        RequestDispatcher::new(
            Arc::new(ReqwestHttpTransport::new(http_client)),
            connectivity.clone(),
            Arc::new(queue),
        )
        .with_access_token(config.access_token.clone()),
    );
    let subscription = subscribe_flush_on_reconnect(dispatcher.clone(), connectivity);

    info!(
        api_base_url = %config.api_base_url,
        offline_queue_path = %config.offline_queue_path.display(),
        online,
        pending = dispatcher.queue().len().await,
        "pennywise-client started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|error| AppError::Internal(format!("failed to read stdin: {error}")))?
    {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match ClientCommand::parse(line, &config) {
            Ok(command) => run_command(&dispatcher, &config, command).await,
            Err(error) => warn!(error = %error, "ignoring malformed command"),
        }
    }

    subscription.shutdown().await;
    match dispatcher.flush_queue().await {
        Ok(FlushReport::Skipped(reason)) => info!(?reason, "final flush skipped"),
        Ok(report) => info!(?report, "final flush finished"),
        Err(error) => warn!(error = %error, "final flush failed"),
    }
    probe.abort();

    info!(
        pending = dispatcher.queue().len().await,
        "pennywise-client stopped"
    );
    Ok(())
}

async fn run_command(
    dispatcher: &RequestDispatcher,
    config: &ClientConfig,
    command: ClientCommand,
) {
    match command {
        ClientCommand::Login { username, password } => {
            match login(dispatcher, config, username.as_str(), password.as_str()).await {
                Ok(()) => info!(username = %username, "logged in"),
                Err(error) => warn!(username = %username, error = %error, "login failed"),
            }
        }
        ClientCommand::Request(request) => {
            let description = request.describe();
            let options = if request.method.is_mutating() {
                DispatchOptions::queued()
            } else {
                DispatchOptions::default()
            };

            match dispatcher.dispatch(request, options).await {
                Ok(response) if response.is_success() => info!(
                    request = %description,
                    status = response.status,
                    body = %response.text(),
                    "request completed"
                ),
                Ok(response) => warn!(
                    request = %description,
                    status = response.status,
                    body = %response.text(),
                    "request rejected"
                ),
                // The queue notifier already reported it.
                Err(AppError::OfflineQueued(_)) => {}
                Err(error) => warn!(request = %description, error = %error, "request failed"),
            }
        }
    }
}

async fn login(
    dispatcher: &RequestDispatcher,
    config: &ClientConfig,
    username: &str,
    password: &str,
) -> AppResult<()> {
    let request = OutboundRequest::new(HttpMethod::Post, config.endpoint("/auth/login")?)
        .with_json_body(json!({ "username": username, "password": password }));
    let response = dispatcher
        .dispatch(request, DispatchOptions::default())
        .await?;

    if !response.is_success() {
        return Err(AppError::Unauthorized(format!(
            "login returned status {}",
            response.status
        )));
    }

    let payload = serde_json::from_slice::<LoginResponse>(&response.body)
        .map_err(|error| AppError::Internal(format!("invalid login response: {error}")))?;
    dispatcher.set_access_token(Some(payload.token));
    Ok(())
}
