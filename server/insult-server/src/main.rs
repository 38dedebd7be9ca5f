use anyhow::{bail, Context};
use clap::Parser;
use config_engine::{ConfigResolver, ResolvedConfig, StandardSources};
use error_common::{log_error, ServiceError};
use events_bus::{EventBus, Transport};
use logger_redacted::{redactor_for, LoggerConfig};
use noun_service::{create_proxy, NounService, ServiceBinder, ServiceMode, NOUN_SERVICE_ADDRESS};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Insult Engine service host
#[derive(Parser, Debug)]
#[command(name = "insult-server")]
#[command(about = "Resolves layered configuration and serves the noun capability")]
struct Args {
    /// Bundled default configuration, must exist
    #[arg(long, env = "INSULT_DEFAULT_CONFIG", default_value = "insult_default_config.json")]
    default_config: PathBuf,

    /// Optional container override file
    #[arg(long, env = "INSULT_LOCAL_CONFIG", default_value = "/opt/docker_config.json")]
    local_config: PathBuf,

    /// ConfigMap consulted when running in a cluster
    #[arg(long, env = "INSULT_CONFIGMAP", default_value = "insult-config")]
    configmap: String,

    /// Variable whose presence enables the ConfigMap and names its namespace
    #[arg(long, env = "INSULT_NAMESPACE_ENV", default_value = "KUBERNETES_NAMESPACE")]
    namespace_env: String,

    /// Bus address the noun implementation is bound to
    #[arg(long, env = "INSULT_NOUN_ADDRESS", default_value = NOUN_SERVICE_ADDRESS)]
    address: String,

    /// How callers reach the noun service: local or proxy
    #[arg(long, env = "INSULT_SERVICE_MODE", default_value = "local")]
    mode: ServiceMode,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "INSULT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "INSULT_JSON_LOGS")]
    json_logs: bool,

    /// Resolve configuration, probe the backend once and exit
    #[arg(long)]
    check: bool,

    /// Serve over NATS instead of the in-process bus
    #[cfg(feature = "nats")]
    #[arg(long, env = "NATS_URL")]
    nats_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env must be loaded before clap reads env fallbacks
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let logger = LoggerConfig::default()
        .with_level(args.log_level.clone())
        .with_json(args.json_logs);
    if let Err(e) = logger_redacted::init(&logger) {
        eprintln!("insult-server: {}", e);
        return ExitCode::FAILURE;
    }

    match run(args, &logger).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{:#}", e), "insult-server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, logger: &LoggerConfig) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), mode = ?args.mode, "Starting insult-server");

    let config = Arc::new(resolve_config(&args).await?);
    match redactor_for(logger) {
        Some(redactor) => info!(config = %redactor.redact_pretty(&config.to_value()), "Configuration resolved"),
        None => info!(config = %config.to_pretty(), "Configuration resolved"),
    }

    let local = match noun_service::create(&config) {
        Ok(service) => service,
        Err(e) => {
            log_error("noun service construction", &e);
            return Err(e).context("invalid noun configuration");
        }
    };

    let transport = connect_transport(&args).await?;
    let registration = ServiceBinder::register(transport.as_ref(), &args.address, local.clone())
        .await
        .with_context(|| format!("binding noun service at {}", args.address))?;

    let noun: Arc<dyn NounService> = match args.mode {
        ServiceMode::Local => local,
        ServiceMode::Proxy => create_proxy(transport.clone(), &args.address),
    };

    let healthy = match noun.health_check().await {
        Ok(healthy) => healthy,
        Err(failure) => {
            warn!(reason = %failure, "Health check could not be dispatched");
            false
        }
    };
    if healthy {
        info!(address = %args.address, "Noun service ready");
    } else {
        warn!(address = %args.address, "Noun service started but backend is unhealthy");
    }

    if args.check {
        transport.unregister(&registration).await?;
        if !healthy {
            bail!("noun backend failed its health check");
        }
        return Ok(());
    }

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("Shutdown requested");
    transport.unregister(&registration).await?;
    Ok(())
}

async fn resolve_config(args: &Args) -> anyhow::Result<ResolvedConfig> {
    let sources = StandardSources {
        default_path: args.default_config.clone(),
        local_path: args.local_config.clone(),
        configmap_name: args.configmap.clone(),
        namespace_var: args.namespace_env.clone(),
    };

    match ConfigResolver::standard(&sources).resolve().await {
        Ok(config) => Ok(config),
        Err(e) => {
            let err = ServiceError::ConfigError(e.to_string());
            log_error("configuration resolution", &err);
            Err(err).context("configuration could not be resolved")
        }
    }
}

#[cfg(feature = "nats")]
async fn connect_transport(args: &Args) -> anyhow::Result<Arc<dyn Transport>> {
    match &args.nats_url {
        Some(url) => {
            let transport = events_bus::NatsTransport::connect(url)
                .await
                .with_context(|| format!("connecting to NATS at {}", url))?;
            info!(url = %url, "Using NATS transport");
            Ok(Arc::new(transport))
        }
        None => Ok(Arc::new(EventBus::new())),
    }
}

#[cfg(not(feature = "nats"))]
async fn connect_transport(_args: &Args) -> anyhow::Result<Arc<dyn Transport>> {
    Ok(Arc::new(EventBus::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["insult-server"]).unwrap();
        assert_eq!(args.default_config, PathBuf::from("insult_default_config.json"));
        assert_eq!(args.local_config, PathBuf::from("/opt/docker_config.json"));
        assert_eq!(args.configmap, "insult-config");
        assert_eq!(args.namespace_env, "KUBERNETES_NAMESPACE");
        assert_eq!(args.address, NOUN_SERVICE_ADDRESS);
        assert_eq!(args.mode, ServiceMode::Local);
        assert!(!args.check);
    }

    #[test]
    fn test_mode_flag() {
        let args = Args::try_parse_from(["insult-server", "--mode", "proxy", "--address", "nouns"]).unwrap();
        assert_eq!(args.mode, ServiceMode::Proxy);
        assert_eq!(args.address, "nouns");

        assert!(Args::try_parse_from(["insult-server", "--mode", "remote"]).is_err());
    }

    #[tokio::test]
    async fn test_builds_service_from_resolved_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let default_config = dir.path().join("insult_default_config.json");
        std::fs::write(&default_config, r#"{"noun": {"host": "localhost", "port": 8080}}"#).unwrap();

        let args = Args::try_parse_from([
            "insult-server",
            "--default-config",
            default_config.to_str().unwrap(),
            "--local-config",
            dir.path().join("absent.json").to_str().unwrap(),
            "--namespace-env",
            "INSULT_TEST_UNSET_NAMESPACE",
        ])
        .unwrap();

        let config = resolve_config(&args).await.unwrap();
        assert!(noun_service::create(&config).is_ok());
    }

    #[tokio::test]
    async fn test_missing_default_config_fails() {
        let args = Args::try_parse_from([
            "insult-server",
            "--default-config",
            "/nonexistent/insult_default_config.json",
            "--namespace-env",
            "INSULT_TEST_UNSET_NAMESPACE",
        ])
        .unwrap();

        let err = resolve_config(&args).await.unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/insult_default_config.json"));
    }
}
