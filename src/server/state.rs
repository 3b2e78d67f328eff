use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use num_bigint::BigUint;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::ids::IdentifierAllocator;
use crate::{
    ChaumPedersenVerifier, Commitment, Error, GroupParameters, NonInteractiveProof, Result,
    SecureRng, Statement,
};

/// Age after which an unanswered challenge is dropped by the server binary.
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);

/// Validity window of a session when none is configured.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| unreachable!("System time is after UNIX_EPOCH"))
        .as_secs()
}

/// Registered user.
#[derive(Clone, Debug)]
pub struct User {
    /// Unique user name.
    pub name: String,
    /// Public values `(y1, y2)`.
    pub statement: Statement,
    /// Identifier of the user's live challenge, if one is outstanding.
    pub pending_challenge: Option<String>,
    /// Unix timestamp of registration.
    pub registered_at: u64,
}

/// Challenge issued by [`AuthServer::create_challenge`] and not yet answered.
pub struct PendingChallenge {
    /// Challenge identifier.
    pub id: String,
    /// Name of the user the challenge was issued to.
    pub user: String,
    /// Unix timestamp of issuance.
    pub issued_at: u64,
    verifier: ChaumPedersenVerifier,
}

impl PendingChallenge {
    /// Returns the challenge value `c`.
    pub fn challenge(&self) -> Option<&BigUint> {
        self.verifier.challenge()
    }
}

/// Session opened by a successful verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Session identifier.
    pub id: String,
    /// Name of the authenticated user.
    pub user: String,
    /// Unix timestamp when the session was opened.
    pub created_at: u64,
    /// Unix timestamp when the session stops being valid.
    pub expires_at: u64,
}

impl Session {
    fn new(id: String, user: String, ttl: Duration) -> Self {
        let created_at = unix_now();
        Self {
            id,
            user,
            created_at,
            expires_at: created_at.saturating_add(ttl.as_secs()),
        }
    }

    /// Whether the session has expired at `now` (Unix seconds).
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    /// Whether the session has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(unix_now())
    }
}

/// Multi-user Chaum-Pedersen authentication server.
///
/// Owns three independently locked tables: users by name, pending challenges
/// by identifier, and sessions by identifier. Operations that hold more than
/// one lock acquire them in that order (users, then challenges, then sessions).
///
/// Atomic regions:
/// - `register`: existence check and insert under the users write lock
/// - `create_challenge`: identifier allocation and insert under the challenges
///   write lock, nested in the users write lock that records the new pending id
/// - `verify_interactive`: challenge removal and pending-id comparison under
///   both write locks
/// - session creation: identifier allocation and insert under the sessions
///   write lock
///
/// Issuing a new challenge for a user supersedes the previous one without
/// removing it; verifying the superseded identifier fails with
/// [`Error::Aborted`]. Unanswered challenges, superseded or abandoned, are
/// reclaimed by [`AuthServer::prune_stale_challenges`].
pub struct AuthServer {
    params: Arc<GroupParameters>,
    session_ttl: Duration,
    ids: IdentifierAllocator,
    users: Arc<RwLock<HashMap<String, User>>>,
    challenges: Arc<RwLock<HashMap<String, PendingChallenge>>>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl AuthServer {
    /// Creates a server over the given group with the default session window.
    pub fn new(params: GroupParameters) -> Self {
        Self::with_session_ttl(params, DEFAULT_SESSION_TTL)
    }

    /// Creates a server with a custom session window.
    pub fn with_session_ttl(params: GroupParameters, session_ttl: Duration) -> Self {
        Self {
            params: Arc::new(params),
            session_ttl,
            ids: IdentifierAllocator,
            users: Arc::new(RwLock::new(HashMap::new())),
            challenges: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the group every registered user proves against.
    pub fn params(&self) -> &GroupParameters {
        &self.params
    }

    /// Returns the session validity window.
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    /// Registers `name` with public values `(y1, y2)`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParams`] if the values are not in the order-`q` subgroup
    /// - [`Error::AlreadyExists`] if the name is taken
    pub async fn register(&self, name: &str, y1: BigUint, y2: BigUint) -> Result<()> {
        let statement = Statement::new(y1, y2);
        statement.validate(&self.params)?;

        let mut users = self.users.write().await;
        if users.contains_key(name) {
            warn!(user = name, "registration rejected: user already exists");
            return Err(Error::AlreadyExists(format!("user '{name}' already exists")));
        }

        users.insert(
            name.to_string(),
            User {
                name: name.to_string(),
                statement,
                pending_challenge: None,
                registered_at: unix_now(),
            },
        );

        info!(user = name, "registered user");
        Ok(())
    }

    /// Issues a challenge for `name` against commitment `(r1, r2)`.
    ///
    /// Returns the challenge identifier and `c`. Any earlier challenge of the
    /// same user is superseded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the user is unknown.
    pub async fn create_challenge(
        &self,
        name: &str,
        commitment: Commitment,
    ) -> Result<(String, BigUint)> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(format!("user '{name}' not found")))?;

        let mut verifier =
            ChaumPedersenVerifier::new(self.params.as_ref().clone(), user.statement.clone())?;
        let c = verifier.issue_challenge(commitment, &mut SecureRng::new());

        let mut challenges = self.challenges.write().await;
        let id = self.ids.allocate(&*challenges);
        challenges.insert(
            id.clone(),
            PendingChallenge {
                id: id.clone(),
                user: name.to_string(),
                issued_at: unix_now(),
                verifier,
            },
        );

        if let Some(previous) = user.pending_challenge.replace(id.clone()) {
            warn!(user = name, superseded = %previous, "challenge superseded");
        }

        debug!(user = name, challenge_id = %id, "issued challenge");
        Ok((id, c))
    }

    /// Checks response `s` for the challenge `challenge_id` and opens a session.
    ///
    /// The challenge is consumed even when verification fails.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the identifier is not a live challenge
    /// - [`Error::Aborted`] if a newer challenge superseded this one
    /// - [`Error::PermissionDenied`] if the response does not verify
    pub async fn verify_interactive(&self, challenge_id: &str, s: &BigUint) -> Result<String> {
        let mut pending = {
            let mut users = self.users.write().await;
            let mut challenges = self.challenges.write().await;

            let pending = challenges.remove(challenge_id).ok_or_else(|| {
                Error::NotFound(format!("challenge '{challenge_id}' not found"))
            })?;

            let user = users.get_mut(&pending.user).ok_or_else(|| {
                Error::NotFound(format!("user '{}' not found", pending.user))
            })?;

            if user.pending_challenge.as_deref() != Some(challenge_id) {
                warn!(
                    user = %pending.user,
                    challenge_id,
                    current = ?user.pending_challenge,
                    "simultaneous authentication detected"
                );
                return Err(Error::Aborted(format!(
                    "challenge '{challenge_id}' was superseded for user '{}'",
                    pending.user
                )));
            }

            user.pending_challenge = None;
            pending
        };

        if !pending.verifier.check_response(s)? {
            warn!(user = %pending.user, "interactive verification failed");
            return Err(Error::PermissionDenied(format!(
                "verification failed for user '{}'",
                pending.user
            )));
        }

        self.open_session(&pending.user).await
    }

    /// Verifies a Fiat-Shamir proof for `name` and opens a session.
    ///
    /// Never touches the pending-challenge table.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if the user is unknown
    /// - [`Error::PermissionDenied`] if the proof does not verify
    pub async fn verify_non_interactive(
        &self,
        name: &str,
        proof: &NonInteractiveProof,
    ) -> Result<String> {
        let statement = {
            let users = self.users.read().await;
            users
                .get(name)
                .map(|user| user.statement.clone())
                .ok_or_else(|| Error::NotFound(format!("user '{name}' not found")))?
        };

        let verifier = ChaumPedersenVerifier::new(self.params.as_ref().clone(), statement)?;
        if !verifier.verify_non_interactive(proof) {
            warn!(user = name, "non-interactive verification failed");
            return Err(Error::PermissionDenied(format!(
                "verification failed for user '{name}'"
            )));
        }

        self.open_session(name).await
    }

    async fn open_session(&self, user: &str) -> Result<String> {
        let mut sessions = self.sessions.write().await;
        let id = self.ids.allocate(&*sessions);
        let session = Session::new(id.clone(), user.to_string(), self.session_ttl);

        info!(
            user,
            session_id = %id,
            expires_at = session.expires_at,
            "opened session"
        );
        sessions.insert(id.clone(), session);
        Ok(id)
    }

    /// Retrieves a registered user.
    pub async fn user(&self, name: &str) -> Option<User> {
        self.users.read().await.get(name).cloned()
    }

    /// Retrieves a session, expired or not.
    pub async fn session(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Removes expired sessions and returns how many were dropped.
    pub async fn prune_expired_sessions(&self) -> usize {
        let now = unix_now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        let pruned = before - sessions.len();

        if pruned > 0 {
            debug!(pruned, "pruned expired sessions");
        }
        pruned
    }

    /// Removes challenges issued at least `max_age` ago, superseded or not,
    /// and returns how many were dropped.
    ///
    /// A dropped challenge that is still a user's live one also clears that
    /// user's pending reference, so later verification reports `NotFound`.
    pub async fn prune_stale_challenges(&self, max_age: Duration) -> usize {
        self.prune_challenges_issued_before(unix_now().saturating_sub(max_age.as_secs()))
            .await
    }

    async fn prune_challenges_issued_before(&self, cutoff: u64) -> usize {
        let mut users = self.users.write().await;
        let mut challenges = self.challenges.write().await;

        let stale: Vec<String> = challenges
            .values()
            .filter(|pending| pending.issued_at <= cutoff)
            .map(|pending| pending.id.clone())
            .collect();

        for id in &stale {
            let Some(pending) = challenges.remove(id) else {
                continue;
            };
            if let Some(user) = users.get_mut(&pending.user) {
                if user.pending_challenge.as_deref() == Some(id.as_str()) {
                    user.pending_challenge = None;
                }
            }
        }

        if !stale.is_empty() {
            debug!(pruned = stale.len(), "pruned stale challenges");
        }
        stale.len()
    }

    /// Number of registered users.
    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }

    /// Number of issued, unanswered challenges (superseded ones included).
    pub async fn pending_challenge_count(&self) -> usize {
        self.challenges.read().await.len()
    }

    /// Number of stored sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for AuthServer {
    fn default() -> Self {
        Self::new(GroupParameters::default_group())
    }
}

impl Clone for AuthServer {
    fn clone(&self) -> Self {
        Self {
            params: Arc::clone(&self.params),
            session_ttl: self.session_ttl,
            ids: self.ids,
            users: Arc::clone(&self.users),
            challenges: Arc::clone(&self.challenges),
            sessions: Arc::clone(&self.sessions),
        }
    }
}
