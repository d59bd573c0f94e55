use std::sync::Arc;

use tokio::sync::Notify;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
mod source;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg.logging)?;

    // 创建 Tokio 运行时，根据 workers 配置设置线程数
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        tracing::info!(workers, "Using configured worker threads");
    } else {
        tracing::info!("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    let proxy_addr = cfg.get_socket_addr()?;
    let origin_addr = cfg.get_origin_socket_addr()?;

    let proxy_listener = server::bind_listener(proxy_addr).map_err(|source| {
        error::ServiceError::Listener {
            service: server::ServiceKind::Proxy.label(),
            source,
        }
    })?;
    let origin_listener = server::bind_listener(origin_addr).map_err(|source| {
        error::ServiceError::Listener {
            service: server::ServiceKind::Origin.label(),
            source,
        }
    })?;

    logger::log_server_start(&proxy_addr, &origin_addr, &cfg);
    let state = Arc::new(config::AppState::new(cfg)?);

    let shutdown = Arc::new(Notify::new());
    server::signal::start_signal_handler(Arc::clone(&shutdown));

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::run_services(
            proxy_listener,
            origin_listener,
            state,
            shutdown,
        ))
        .await?;

    Ok(())
}
