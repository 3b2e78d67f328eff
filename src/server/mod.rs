/// Server configuration and rate limiting.
pub mod config;

/// Collision-free identifier allocation.
pub mod ids;

/// Multi-user authentication state.
pub mod state;

/// gRPC service implementation.
#[cfg(feature = "grpc")]
pub mod service;

pub use config::{GroupSetting, RateLimitSettings, RateLimiter, ServerConfig};
pub use ids::{IdentifierAllocator, Namespace};
#[cfg(feature = "grpc")]
pub use service::AuthService;
pub use state::{
    AuthServer, PendingChallenge, Session, User, DEFAULT_CHALLENGE_TTL, DEFAULT_SESSION_TTL,
};
