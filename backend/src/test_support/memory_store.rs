//! In-memory implementation of both repository ports.
//!
//! Every port call runs against a scratch copy of the state that replaces
//! the live state only on success, which gives the same all-or-nothing
//! behaviour as a store transaction. Expiry uses the injected clock in the
//! role the database clock plays in production.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use uuid::Uuid;

use crate::domain::ports::{
    AccountRepository, AccountRepositoryError, CodeConsumeOutcome, CodeIssueOutcome, NewAccount,
    RatingRepository, RatingRepositoryError,
};
use crate::domain::{
    Account, AccountId, AccountStatus, AggregateRating, CredentialDigest, DisplayName,
    EmailAddress, NewRating, PendingVerification, ProfessionalId, ProfileKind,
    ProvisionedAccount, Rating, RatingChange, RatingId, RatingState, Role, RoleProfile,
    SessionId, VerificationCode,
};

#[derive(Debug, Clone)]
struct AccountRecord {
    id: AccountId,
    email: EmailAddress,
    credential_digest: Option<CredentialDigest>,
    display_name: DisplayName,
    role: Role,
    active: bool,
    pending: Option<PendingVerification>,
}

impl AccountRecord {
    fn to_account(&self) -> Account {
        let status = if self.active {
            AccountStatus::Active
        } else {
            AccountStatus::Pending(self.pending.clone())
        };
        Account::new(
            self.id,
            self.email.clone(),
            self.credential_digest.clone(),
            self.display_name.clone(),
            self.role,
            status,
        )
    }
}

#[derive(Debug, Clone)]
struct ProfessionalRecord {
    account_id: AccountId,
    average_rating: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
struct SessionRecord {
    professional_id: ProfessionalId,
    completed: bool,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    accounts: BTreeMap<AccountId, AccountRecord>,
    professionals: BTreeMap<ProfessionalId, ProfessionalRecord>,
    clients: BTreeMap<Uuid, AccountId>,
    sessions: HashMap<SessionId, SessionRecord>,
    ratings: BTreeMap<RatingId, Rating>,
}

#[derive(Debug, Clone, Copy, Default)]
struct FailurePlan {
    unavailable: bool,
    profile_insert: bool,
    recompute: bool,
}

/// Shared in-memory store with failure injection.
pub struct InMemoryStore {
    state: Mutex<StoreState>,
    failures: Mutex<FailurePlan>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl InMemoryStore {
    /// Empty store reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            failures: Mutex::new(FailurePlan::default()),
            clock,
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("store mutex poisoned"),
        }
    }

    fn failures(&self) -> MutexGuard<'_, FailurePlan> {
        match self.failures.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("failure plan mutex poisoned"),
        }
    }

    /// Make every call fail as if the connection had dropped.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.failures().unavailable = unavailable;
    }

    /// Fail the profile write of every provisioning after the account write.
    pub fn fail_profile_inserts(&self, fail: bool) {
        self.failures().profile_insert = fail;
    }

    /// Fail aggregate recomputation with a connection error.
    pub fn fail_recompute(&self, fail: bool) {
        self.failures().recompute = fail;
    }

    pub fn account_count(&self) -> usize {
        self.state().accounts.len()
    }

    /// Professional plus client profile rows.
    pub fn profile_count(&self) -> usize {
        let state = self.state();
        state.professionals.len() + state.clients.len()
    }

    /// Account a profile row belongs to, `None` when the row is missing.
    pub fn profile_owner(&self, profile: &RoleProfile) -> Option<AccountId> {
        let state = self.state();
        match profile.kind {
            ProfileKind::Professional => state
                .professionals
                .get(&ProfessionalId::from_uuid(profile.id))
                .map(|record| record.account_id),
            ProfileKind::Client => state.clients.get(&profile.id).copied(),
        }
    }

    /// Stored aggregate, `None` when the professional does not exist.
    pub fn stored_aggregate(&self, professional_id: &ProfessionalId) -> Option<AggregateRating> {
        self.state()
            .professionals
            .get(professional_id)
            .map(|profile| AggregateRating::from(profile.average_rating))
    }

    /// Overwrite a stored aggregate, e.g. to simulate drift before a
    /// reconciliation pass.
    pub fn corrupt_aggregate(&self, professional_id: &ProfessionalId, value: Option<f64>) {
        if let Some(profile) = self.state().professionals.get_mut(professional_id) {
            profile.average_rating = value;
        }
    }

    /// Insert a session with `professional_id`.
    pub fn seed_session(&self, professional_id: &ProfessionalId, completed: bool) -> SessionId {
        let id = SessionId::random();
        self.state().sessions.insert(
            id,
            SessionRecord {
                professional_id: *professional_id,
                completed,
            },
        );
        id
    }

    pub fn complete_session(&self, session_id: &SessionId) {
        if let Some(session) = self.state().sessions.get_mut(session_id) {
            session.completed = true;
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    fn account_guard(&self) -> Result<(), AccountRepositoryError> {
        if self.failures().unavailable {
            return Err(AccountRepositoryError::connection("store unavailable"));
        }
        Ok(())
    }

    fn rating_guard(&self) -> Result<(), RatingRepositoryError> {
        if self.failures().unavailable {
            return Err(RatingRepositoryError::connection("store unavailable"));
        }
        Ok(())
    }
}

fn ttl_delta(ttl: Duration) -> Result<TimeDelta, AccountRepositoryError> {
    TimeDelta::from_std(ttl).map_err(|err| AccountRepositoryError::query(err.to_string()))
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create_with_profile(
        &self,
        account: &NewAccount,
    ) -> Result<ProvisionedAccount, AccountRepositoryError> {
        self.account_guard()?;
        let fail_profile = self.failures().profile_insert;
        let mut live = self.state();
        let mut tx = live.clone();

        if tx.accounts.values().any(|existing| existing.email == account.email) {
            return Err(AccountRepositoryError::duplicate_email());
        }
        let record = AccountRecord {
            id: account.id,
            email: account.email.clone(),
            credential_digest: account.credential_digest.clone(),
            display_name: account.display_name.clone(),
            role: account.role,
            active: account.active,
            pending: None,
        };
        tx.accounts.insert(account.id, record.clone());

        let profile = match account.role.profile_kind() {
            Some(_) if fail_profile => {
                return Err(AccountRepositoryError::query("profile insert failed"));
            }
            Some(ProfileKind::Professional) => {
                let id = Uuid::new_v4();
                tx.professionals.insert(
                    ProfessionalId::from_uuid(id),
                    ProfessionalRecord {
                        account_id: account.id,
                        average_rating: None,
                    },
                );
                Some(RoleProfile {
                    kind: ProfileKind::Professional,
                    id,
                })
            }
            Some(ProfileKind::Client) => {
                let id = Uuid::new_v4();
                tx.clients.insert(id, account.id);
                Some(RoleProfile {
                    kind: ProfileKind::Client,
                    id,
                })
            }
            None => None,
        };

        *live = tx;
        Ok(ProvisionedAccount {
            account: record.to_account(),
            profile,
        })
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountRepositoryError> {
        self.account_guard()?;
        Ok(self.state().accounts.get(id).map(AccountRecord::to_account))
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, AccountRepositoryError> {
        self.account_guard()?;
        Ok(self
            .state()
            .accounts
            .values()
            .find(|record| &record.email == email)
            .map(AccountRecord::to_account))
    }

    async fn store_verification_code(
        &self,
        id: &AccountId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<CodeIssueOutcome, AccountRepositoryError> {
        self.account_guard()?;
        let expires_at = self.now() + ttl_delta(ttl)?;
        let mut state = self.state();
        let Some(record) = state.accounts.get_mut(id) else {
            return Ok(CodeIssueOutcome::AccountNotFound);
        };
        if record.active {
            return Ok(CodeIssueOutcome::AlreadyActive);
        }
        record.pending = Some(PendingVerification::new(code.clone(), expires_at));
        Ok(CodeIssueOutcome::Issued {
            email: record.email.clone(),
            expires_at,
        })
    }

    async fn consume_verification_code(
        &self,
        email: &EmailAddress,
        code: &VerificationCode,
    ) -> Result<CodeConsumeOutcome, AccountRepositoryError> {
        self.account_guard()?;
        let now = self.now();
        let mut state = self.state();
        let Some(record) = state
            .accounts
            .values_mut()
            .find(|record| &record.email == email)
        else {
            return Ok(CodeConsumeOutcome::Rejected);
        };
        if record.active {
            return Ok(CodeConsumeOutcome::AlreadyActive);
        }
        let matches = record
            .pending
            .as_ref()
            .is_some_and(|pending| pending.code() == code && pending.is_live_at(now));
        if !matches {
            return Ok(CodeConsumeOutcome::Rejected);
        }
        record.active = true;
        record.pending = None;
        Ok(CodeConsumeOutcome::Activated(record.to_account()))
    }
}

#[async_trait]
impl RatingRepository for InMemoryStore {
    async fn insert_rating(&self, rating: &NewRating) -> Result<Rating, RatingRepositoryError> {
        self.rating_guard()?;
        let created_at = self.now();
        let mut state = self.state();
        let session = state
            .sessions
            .get(&rating.session_id)
            .copied()
            .ok_or_else(RatingRepositoryError::session_not_found)?;
        if !session.completed {
            return Err(RatingRepositoryError::session_not_completed());
        }
        if state.ratings.contains_key(&rating.id) {
            return Err(RatingRepositoryError::query("rating already exists"));
        }
        let stored = Rating {
            id: rating.id,
            session_id: rating.session_id,
            professional_id: session.professional_id,
            score: rating.score,
            comment: rating.comment.clone(),
            state: RatingState::Active,
            created_at,
        };
        state.ratings.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn apply_change(
        &self,
        id: &RatingId,
        change: &RatingChange,
    ) -> Result<Option<Rating>, RatingRepositoryError> {
        self.rating_guard()?;
        Ok(self.state().ratings.get_mut(id).map(|rating| {
            change.apply_to(rating);
            rating.clone()
        }))
    }

    async fn delete_rating(&self, id: &RatingId) -> Result<Option<Rating>, RatingRepositoryError> {
        self.rating_guard()?;
        Ok(self.state().ratings.remove(id))
    }

    async fn recompute_aggregate(
        &self,
        professional_id: &ProfessionalId,
    ) -> Result<Option<AggregateRating>, RatingRepositoryError> {
        self.rating_guard()?;
        if self.failures().recompute {
            return Err(RatingRepositoryError::connection("statement timeout"));
        }
        let mut state = self.state();
        let aggregate = AggregateRating::from_scores(
            state
                .ratings
                .values()
                .filter(|rating| {
                    rating.professional_id == *professional_id
                        && rating.state == RatingState::Active
                })
                .map(|rating| rating.score),
        );
        let Some(profile) = state.professionals.get_mut(professional_id) else {
            return Ok(None);
        };
        profile.average_rating = aggregate.as_option();
        Ok(Some(aggregate))
    }

    async fn professional_ids(&self) -> Result<Vec<ProfessionalId>, RatingRepositoryError> {
        self.rating_guard()?;
        Ok(self.state().professionals.keys().copied().collect())
    }
}
