//! Server entry-point: loads settings, migrates the schema, and serves the
//! REST API.

use std::io;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use marketplace::ApiDoc;
use marketplace::Trace;
use marketplace::domain::{
    AccountProvisioningService, AccountVerificationService, RandomCodeGenerator,
    RatingConsistencyService, VerificationPolicy,
};
use marketplace::inbound::http::configure_api;
use marketplace::inbound::http::health::{HealthState, live, ready};
use marketplace::inbound::http::state::HttpState;
use marketplace::outbound::persistence::{
    DbPool, DieselAccountRepository, DieselRatingRepository, run_pending_migrations,
};
use marketplace::outbound::{Argon2CredentialStore, TracingVerificationNotifier};
use marketplace::settings::MarketplaceSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = MarketplaceSettings::load()
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let bind_addr = settings.bind_addr().map_err(io::Error::other)?;
    let policy = settings.verification_policy().map_err(io::Error::other)?;
    let pool_config = settings.pool_config().map_err(io::Error::other)?;

    run_pending_migrations(pool_config.database_url())
        .await
        .map_err(|error| io::Error::other(format!("migrate database: {error}")))?;
    let pool = DbPool::new(pool_config)
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let state = build_state(pool, policy);
    let health_state = web::Data::new(HealthState::new());
    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || build_app(state.clone(), server_health_state.clone()))
        .bind(bind_addr)?;

    health_state.mark_ready();
    info!(%bind_addr, "marketplace listening");
    let result = server.run().await;
    health_state.mark_draining();
    result
}

fn build_state(pool: DbPool, policy: VerificationPolicy) -> HttpState {
    let accounts = Arc::new(DieselAccountRepository::new(pool.clone()));
    let ratings = Arc::new(DieselRatingRepository::new(pool));
    let generator = Arc::new(RandomCodeGenerator::new(&policy));

    HttpState::new(
        Arc::new(AccountProvisioningService::new(
            accounts.clone(),
            Arc::new(Argon2CredentialStore::default()),
        )),
        Arc::new(AccountVerificationService::new(
            accounts,
            generator,
            Arc::new(TracingVerificationNotifier),
            policy,
        )),
        Arc::new(RatingConsistencyService::new(ratings)),
    )
}

fn build_app(
    state: HttpState,
    health_state: web::Data<HealthState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let app = App::new()
        .app_data(web::Data::new(state))
        .app_data(health_state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app =
        app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}
