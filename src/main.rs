use std::sync::Arc;
use tokio::signal;
use vestiaire::api;
use vestiaire::logger::*;
use vestiaire::server::*;
use vestiaire::settings::*;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let address: std::net::SocketAddr = cli
        .address
        .as_deref()
        .unwrap_or(&project_settings.http.address)
        .parse()?;

    let server = Arc::new(Server::try_new(&project_settings)?);

    let api_v1 = warp::path("api")
        .and(warp::path("v1"))
        .and(api::v1::routes(server.clone()))
        .recover(api::v1::recover_error);

    match &project_settings.http.tls {
        Some(tls) => {
            if !std::fs::metadata(&tls.cert_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS cert is not a regular file: {:?}",
                    tls.cert_path
                ));
            }
            if !std::fs::metadata(&tls.key_path)?.is_file() {
                return Err(anyhow::anyhow!(
                    "TLS key is not a regular file: {:?}",
                    tls.key_path
                ));
            }
            warp::serve(api_v1)
                .tls()
                .cert_path(&tls.cert_path)
                .key_path(&tls.key_path)
                .bind_with_graceful_shutdown(address, async {
                    signal::ctrl_c().await.expect("Could not register SIGINT");
                })
                .1
                .await;
        }
        None => {
            warp::serve(api_v1)
                .bind_with_graceful_shutdown(address, async {
                    signal::ctrl_c().await.expect("Could not register SIGINT");
                })
                .1
                .await;
        }
    }

    info!("server shut down");
    Ok(())
}
