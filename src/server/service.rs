use num_bigint::BigUint;
use tonic::{Request, Response, Status};
use tracing::debug;

use super::config::RateLimiter;
use super::state::AuthServer;
use crate::proto::auth_server::Auth;
use crate::proto::{
    AuthenticationAnswerRequest, AuthenticationAnswerResponse, AuthenticationChallengeRequest,
    AuthenticationChallengeResponse, GroupParametersRequest, GroupParametersResponse,
    NonInteractiveAuthenticationRequest, RegisterRequest, RegisterResponse,
};
use crate::{Commitment, Error, NonInteractiveProof};

const MAX_USER_LEN: usize = 256;

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidParams(msg) => Status::invalid_argument(msg),
            Error::InvalidState(msg) => Status::failed_precondition(msg),
            Error::AlreadyExists(msg) => Status::already_exists(msg),
            Error::NotFound(msg) => Status::not_found(msg),
            Error::Aborted(msg) => Status::aborted(msg),
            Error::PermissionDenied(msg) => Status::permission_denied(msg),
        }
    }
}

/// gRPC front end of [`AuthServer`].
pub struct AuthService {
    server: AuthServer,
    limiter: RateLimiter,
    max_integer_len: usize,
}

impl AuthService {
    /// Wraps `server`, admitting requests through `limiter`.
    pub fn new(server: AuthServer, limiter: RateLimiter) -> Self {
        let max_integer_len = server.params().p().to_bytes_be().len();
        Self {
            server,
            limiter,
            max_integer_len,
        }
    }

    /// Returns the wrapped server.
    pub fn server(&self) -> &AuthServer {
        &self.server
    }

    async fn admit(&self) -> Result<(), Status> {
        if self.limiter.try_acquire().await {
            Ok(())
        } else {
            Err(Status::resource_exhausted("Rate limit exceeded"))
        }
    }

    #[allow(clippy::result_large_err)]
    fn validate_user(user: &str) -> Result<(), Status> {
        if user.is_empty() {
            return Err(Status::invalid_argument("User name cannot be empty"));
        }

        if user.len() > MAX_USER_LEN {
            return Err(Status::invalid_argument("User name too long"));
        }

        if !user
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(Status::invalid_argument(
                "User name contains invalid characters",
            ));
        }

        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn validate_id(field: &str, id: &str) -> Result<(), Status> {
        if id.is_empty() {
            return Err(Status::invalid_argument(format!("Empty {field}")));
        }

        if id.len() > super::IdentifierAllocator::ID_LEN {
            return Err(Status::invalid_argument(format!("{field} too long")));
        }

        Ok(())
    }

    #[allow(clippy::result_large_err)]
    fn integer(&self, field: &str, bytes: &[u8]) -> Result<BigUint, Status> {
        if bytes.len() > self.max_integer_len {
            return Err(Status::invalid_argument(format!("{field} too large")));
        }
        Ok(BigUint::from_bytes_be(bytes))
    }
}

#[tonic::async_trait]
impl Auth for AuthService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<RegisterResponse>, Status> {
        self.admit().await?;
        let req = request.into_inner();

        Self::validate_user(&req.user)?;
        let y1 = self.integer("y1", &req.y1)?;
        let y2 = self.integer("y2", &req.y2)?;

        self.server.register(&req.user, y1, y2).await?;

        Ok(Response::new(RegisterResponse {}))
    }

    async fn create_authentication_challenge(
        &self,
        request: Request<AuthenticationChallengeRequest>,
    ) -> Result<Response<AuthenticationChallengeResponse>, Status> {
        self.admit().await?;
        let req = request.into_inner();

        Self::validate_user(&req.user)?;
        let commitment = Commitment::new(self.integer("r1", &req.r1)?, self.integer("r2", &req.r2)?);

        let (auth_id, c) = self.server.create_challenge(&req.user, commitment).await?;

        Ok(Response::new(AuthenticationChallengeResponse {
            auth_id,
            c: c.to_bytes_be(),
        }))
    }

    async fn verify_authentication(
        &self,
        request: Request<AuthenticationAnswerRequest>,
    ) -> Result<Response<AuthenticationAnswerResponse>, Status> {
        self.admit().await?;
        let req = request.into_inner();

        Self::validate_id("auth_id", &req.auth_id)?;
        let s = self.integer("s", &req.s)?;

        let session_id = self.server.verify_interactive(&req.auth_id, &s).await?;

        Ok(Response::new(AuthenticationAnswerResponse { session_id }))
    }

    async fn verify_authentication_non_interactive(
        &self,
        request: Request<NonInteractiveAuthenticationRequest>,
    ) -> Result<Response<AuthenticationAnswerResponse>, Status> {
        self.admit().await?;
        let req = request.into_inner();

        Self::validate_user(&req.user)?;
        let proof = NonInteractiveProof::new(
            Commitment::new(self.integer("r1", &req.r1)?, self.integer("r2", &req.r2)?),
            self.integer("c", &req.c)?,
            self.integer("s", &req.s)?,
        );

        let session_id = self.server.verify_non_interactive(&req.user, &proof).await?;

        Ok(Response::new(AuthenticationAnswerResponse { session_id }))
    }

    async fn get_group_parameters(
        &self,
        _request: Request<GroupParametersRequest>,
    ) -> Result<Response<GroupParametersResponse>, Status> {
        self.admit().await?;
        debug!("serving group parameters");

        let params = self.server.params();
        Ok(Response::new(GroupParametersResponse {
            p: params.p().to_bytes_be(),
            q: params.q().to_bytes_be(),
            generators: params.generators().iter().map(BigUint::to_bytes_be).collect(),
        }))
    }
}
