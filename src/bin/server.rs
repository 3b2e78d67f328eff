use std::time::Duration;

use clap::Parser;
use tokio::{signal, time};
use tonic::transport::Server;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zkp_auth::proto::auth_server::AuthServer as AuthGrpcServer;
use zkp_auth::server::{AuthService, GroupSetting};
use zkp_auth::{AuthServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Zero-knowledge authentication server", long_about = None)]
#[command(version)]
struct Args {
    /// Host to bind to (overrides configuration)
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on (overrides configuration)
    #[arg(short, long)]
    port: Option<u16>,

    /// Derive a fresh group of this many bits instead of the built-in one
    #[arg(long)]
    group_bits: Option<u64>,

    /// Interval between sweeps of expired sessions and stale challenges, in seconds
    #[arg(long, env = "SESSION_PRUNE_INTERVAL", default_value = "60")]
    prune_interval: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServerConfig::from_env().unwrap_or_else(|e| {
        error!("Failed to load configuration: {e}");
        info!("Using default configuration");
        ServerConfig::default()
    });

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bits) = args.group_bits {
        config.group = GroupSetting::Generated { bits };
    }

    config.validate()?;

    let params = config.group_parameters()?;
    info!(
        p = %params.p(),
        q = %params.q(),
        g = %params.generator_g(),
        generators = params.generators().len(),
        "group parameters"
    );

    let state = AuthServer::with_session_ttl(params, config.session_ttl());
    let service = AuthService::new(state.clone(), config.rate_limit.build_limiter());

    let prune_state = state.clone();
    let prune_every = Duration::from_secs(args.prune_interval.max(1));
    let challenge_ttl = config.challenge_ttl();
    tokio::spawn(async move {
        let mut interval = time::interval(prune_every);
        loop {
            interval.tick().await;
            let sessions = prune_state.prune_expired_sessions().await;
            let challenges = prune_state.prune_stale_challenges(challenge_ttl).await;
            if sessions > 0 || challenges > 0 {
                info!(sessions, challenges, "expired state removed");
            }
        }
    });

    let addr = config.addr()?;
    info!(
        %addr,
        session_ttl_secs = config.session_ttl_secs,
        challenge_ttl_secs = config.challenge_ttl_secs,
        requests_per_minute = config.rate_limit.requests_per_minute,
        burst = config.rate_limit.burst,
        "server starting"
    );

    Server::builder()
        .add_service(AuthGrpcServer::new(service))
        .serve_with_shutdown(addr, shutdown_signal())
        .await?;

    info!(
        users = state.user_count().await,
        sessions = state.session_count().await,
        "server shutdown complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Initiating graceful shutdown (allowing in-flight requests to complete)");
}
