use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::{AppConfig, ServerConfig};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::routes::{self, AppState};
use service::customer::{
    mailer::{LogMailer, Mailer, SmtpMailer},
    repo::mongo::MongoCustomerRepository,
    service::DEFAULT_TIMEOUT,
    CustomerConfig, CustomerService,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", server.host, server.port).parse()?)
}

/// Wire the store, mailer and customer service from configuration.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store = models::db::connect(&cfg.database).await?;
    let repo = MongoCustomerRepository::new(store.customers);
    repo.ensure_indexes().await?;

    let mailer: Arc<dyn Mailer> = match &cfg.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, port = smtp.port, "smtp mailer configured");
            Arc::new(SmtpMailer::new(smtp)?)
        }
        None => {
            warn!("no smtp configuration; verification emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let svc = CustomerService::new(
        Arc::new(repo),
        mailer,
        CustomerConfig { app_url: cfg.app.base_url.clone(), timeout: DEFAULT_TIMEOUT },
    );
    Ok(AppState { customers: Arc::new(svc) })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for ctrl-c; graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

/// Public entry: build the app and run the HTTP server until Ctrl+C.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting customer api");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_addr_from_config() {
        let addr = bind_addr(&ServerConfig::default()).expect("addr");
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn bind_addr_rejects_hostnames() {
        let cfg = ServerConfig { host: "not a host".into(), ..ServerConfig::default() };
        assert!(bind_addr(&cfg).is_err());
    }
}
