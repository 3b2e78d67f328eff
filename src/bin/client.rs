use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use num_bigint::BigUint;
use rand::RngCore;
use tonic::transport::Channel;
use tonic::Request;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use zkp_auth::proto::auth_client::AuthClient;
use zkp_auth::proto::{
    AuthenticationAnswerRequest, AuthenticationChallengeRequest, GroupParametersRequest,
    NonInteractiveAuthenticationRequest, RegisterRequest,
};
use zkp_auth::{ChaumPedersenProver, GroupParameters, SecureRng};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Commit, receive a challenge, respond
    Interactive,
    /// Single Fiat-Shamir proof
    NonInteractive,
    /// Switch mode on every user
    Alternate,
}

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Simulates users registering and logging in", long_about = None)]
struct Cli {
    /// Server URL
    #[arg(short, long, env = "ZKP_SERVER", default_value = "http://127.0.0.1:50051")]
    server: String,

    /// Number of users to simulate (0 runs forever)
    #[arg(short, long, default_value = "10")]
    users: u64,

    /// Pause between users in milliseconds
    #[arg(short, long, default_value = "500")]
    delay_ms: u64,

    /// Login flow
    #[arg(short, long, value_enum, default_value = "alternate")]
    mode: Mode,
}

fn random_user_name(rng: &mut SecureRng) -> String {
    let mut bytes = [0u8; 8];
    rng.fill_bytes(&mut bytes);
    format!("user-{}", hex::encode(bytes))
}

async fn fetch_group(
    client: &mut AuthClient<Channel>,
) -> Result<GroupParameters, Box<dyn std::error::Error>> {
    let response = client
        .get_group_parameters(Request::new(GroupParametersRequest {}))
        .await?
        .into_inner();

    let params = GroupParameters::new(
        BigUint::from_bytes_be(&response.p),
        BigUint::from_bytes_be(&response.q),
        response
            .generators
            .iter()
            .map(|g| BigUint::from_bytes_be(g))
            .collect(),
    )?;
    Ok(params)
}

async fn login_interactive(
    client: &mut AuthClient<Channel>,
    prover: &mut ChaumPedersenProver,
    user: &str,
    rng: &mut SecureRng,
) -> Result<String, Box<dyn std::error::Error>> {
    let commitment = prover.commit(rng)?;
    let challenge = client
        .create_authentication_challenge(Request::new(AuthenticationChallengeRequest {
            user: user.to_string(),
            r1: commitment.r1().to_bytes_be(),
            r2: commitment.r2().to_bytes_be(),
        }))
        .await?
        .into_inner();

    let s = prover.respond(&BigUint::from_bytes_be(&challenge.c))?;
    let answer = client
        .verify_authentication(Request::new(AuthenticationAnswerRequest {
            auth_id: challenge.auth_id,
            s: s.to_bytes_be(),
        }))
        .await?
        .into_inner();

    Ok(answer.session_id)
}

async fn login_non_interactive(
    client: &mut AuthClient<Channel>,
    prover: &mut ChaumPedersenProver,
    user: &str,
    rng: &mut SecureRng,
) -> Result<String, Box<dyn std::error::Error>> {
    let proof = prover.prove_non_interactive(rng)?;
    let answer = client
        .verify_authentication_non_interactive(Request::new(
            NonInteractiveAuthenticationRequest {
                user: user.to_string(),
                r1: proof.commitment().r1().to_bytes_be(),
                r2: proof.commitment().r2().to_bytes_be(),
                c: proof.challenge().to_bytes_be(),
                s: proof.response().to_bytes_be(),
            },
        ))
        .await?
        .into_inner();

    Ok(answer.session_id)
}

async fn simulate_user(
    client: &mut AuthClient<Channel>,
    params: &GroupParameters,
    mode: Mode,
    rng: &mut SecureRng,
) -> Result<(String, String), Box<dyn std::error::Error>> {
    let user = random_user_name(rng);
    let mut prover = ChaumPedersenProver::new(params.clone(), rng)?;

    client
        .register(Request::new(RegisterRequest {
            user: user.clone(),
            y1: prover.statement().y1().to_bytes_be(),
            y2: prover.statement().y2().to_bytes_be(),
        }))
        .await?;

    let session_id = match mode {
        Mode::NonInteractive => login_non_interactive(client, &mut prover, &user, rng).await?,
        _ => login_interactive(client, &mut prover, &user, rng).await?,
    };

    Ok((user, session_id))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut client = AuthClient::connect(cli.server.clone()).await?;
    let params = fetch_group(&mut client).await?;
    info!(server = %cli.server, p = %params.p(), q = %params.q(), "connected");

    let mut rng = SecureRng::new();
    let mut succeeded = 0u64;
    let mut failed = 0u64;
    let start = Instant::now();

    let mut n = 0u64;
    while cli.users == 0 || n < cli.users {
        let mode = match cli.mode {
            Mode::Alternate if n % 2 == 0 => Mode::Interactive,
            Mode::Alternate => Mode::NonInteractive,
            mode => mode,
        };

        match simulate_user(&mut client, &params, mode, &mut rng).await {
            Ok((user, session_id)) => {
                succeeded += 1;
                info!(%user, ?mode, %session_id, "authenticated");
            }
            Err(e) => {
                failed += 1;
                error!(?mode, "simulation failed: {e}");
            }
        }

        n += 1;
        if cli.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cli.delay_ms)).await;
        }
    }

    info!(
        succeeded,
        failed,
        elapsed = ?start.elapsed(),
        "simulation finished"
    );
    Ok(())
}
