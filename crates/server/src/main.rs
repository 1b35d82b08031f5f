use auth_service::AppResources;
use auth_service::api::start_webserver;
use auth_service::auth::JwksTokenVerifier;
use auth_service::config::load_config_or_panic;
use auth_service::identity_provider::KeycloakAdminClient;
use auth_service::provisioning::ProvisioningService;
use auth_service::store::SeaOrmUserStore;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing() {
    let default_directives = "auth_service=info,tower_http=info,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    initialize_tracing();

    let config = Arc::new(load_config_or_panic());

    let db = Arc::new(Database::connect(&config.database_url).await?);

    let verifier = JwksTokenVerifier::new(&config.jwt)?;
    tracing::info!(jwks_uri = %verifier.jwks_uri(), issuer = %config.jwt.issuer_uri, "token verification configured");

    let identity_provider = KeycloakAdminClient::new(&config.identity_provider)?;
    tracing::info!(
        base_url = %config.identity_provider.base_url,
        realm = %config.identity_provider.realm,
        client_id = %config.identity_provider.client_id,
        default_role = %config.identity_provider.default_role,
        "identity provider configured"
    );

    let provisioning = ProvisioningService::new(
        Arc::new(SeaOrmUserStore::new(db)),
        Arc::new(identity_provider),
        config.identity_provider.default_role.clone(),
    );

    let resources = AppResources {
        config,
        verifier: Arc::new(verifier),
        provisioning: Arc::new(provisioning),
    };

    start_webserver(resources).await?;
    Ok(())
}
