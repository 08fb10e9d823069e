//! Shared wiring for the integration suites: real services over the
//! in-memory store and a manually advanced clock.

#![allow(dead_code, reason = "each suite uses a different subset")]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use marketplace::domain::ports::{
    AccountProvisioning, FixtureCodeGenerator, FixtureCredentialStore,
    FixtureVerificationNotifier, ProvisionAccountRequest,
};
use marketplace::domain::{
    AccountProvisioningService, AccountVerificationService, ProfessionalId, ProvisionedAccount,
    RatingConsistencyService, VerificationCode, VerificationPolicy,
};
use marketplace::test_support::{InMemoryStore, MutableClock};
use mockable::Clock;

pub const FIXTURE_CODE: &str = "482913";

pub type Provisioning = AccountProvisioningService<InMemoryStore, FixtureCredentialStore>;
pub type Verification =
    AccountVerificationService<InMemoryStore, FixtureCodeGenerator, FixtureVerificationNotifier>;
pub type Ratings = RatingConsistencyService<InMemoryStore>;

pub struct Harness {
    pub clock: Arc<MutableClock>,
    pub store: Arc<InMemoryStore>,
    pub provisioning: Arc<Provisioning>,
    pub verification: Arc<Verification>,
    pub ratings: Arc<Ratings>,
}

impl Harness {
    pub fn new() -> Self {
        let clock = Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0)
                .single()
                .expect("valid instant"),
        ));
        let store = Arc::new(InMemoryStore::new(clock.clone()));
        Self {
            provisioning: Arc::new(AccountProvisioningService::new(
                store.clone(),
                Arc::new(FixtureCredentialStore),
            )),
            verification: Arc::new(AccountVerificationService::new(
                store.clone(),
                Arc::new(FixtureCodeGenerator(VerificationCode::from(FIXTURE_CODE))),
                Arc::new(FixtureVerificationNotifier),
                VerificationPolicy::default(),
            )),
            ratings: Arc::new(RatingConsistencyService::new(store.clone())),
            clock,
            store,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    pub async fn provision(&self, email: &str, role: &str) -> ProvisionedAccount {
        let request = ProvisionAccountRequest::parse(email, Some("s3cret!"), "Someone", role, None)
            .expect("valid request");
        self.provisioning
            .provision(request)
            .await
            .expect("provisioned")
    }

    pub async fn professional(&self, email: &str) -> ProfessionalId {
        self.provision(email, "professional")
            .await
            .profile
            .and_then(|profile| profile.professional_id())
            .expect("professional profile")
    }
}
