//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::Trace;
use crate::domain::ports::{
    MockAccountProvisioning, MockAccountVerification, MockRatingMaintenance,
};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::HttpState;

/// Mocked driving ports; tests set expectations before building the app.
#[derive(Default)]
pub struct MockPorts {
    pub provisioning: MockAccountProvisioning,
    pub verification: MockAccountVerification,
    pub ratings: MockRatingMaintenance,
}

/// Build the `/api/v1` app over the given mocks, wrapped in [`Trace`].
pub fn test_app(
    ports: MockPorts,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(
        Arc::new(ports.provisioning),
        Arc::new(ports.verification),
        Arc::new(ports.ratings),
    );
    App::new()
        .app_data(web::Data::new(state))
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}
