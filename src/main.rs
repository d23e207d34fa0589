//! walletauth application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Build shared state (empty user registry, token provider)
//! 3. Build router with API routes, CORS and body limit
//! 4. Start Axum server
//!
//! Also supports `keygen` and `sign` subcommands for exercising the API
//! without a browser wallet.

use k256::ecdsa::SigningKey;
use tower_http::cors::CorsLayer;
use walletauth::{
    auth::{verify, AppState},
    config::Config,
    routes,
};

/// Generate a random secp256k1 key. Returns (private key hex, address).
fn keygen() -> Result<(String, String), String> {
    use rand::{rngs::OsRng, TryRngCore};
    use zeroize::Zeroize;

    let mut seed = [0u8; 32];
    // A uniformly random 32-byte string is a valid scalar with overwhelming
    // probability; retry on the rare miss.
    let key = loop {
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| format!("Random source: {}", e))?;
        if let Ok(key) = SigningKey::from_slice(&seed) {
            break key;
        }
    };
    seed.zeroize();

    let address = verify::address_of(key.verifying_key());
    Ok((
        format!("0x{}", hex::encode(key.to_bytes())),
        address.to_string(),
    ))
}

/// Sign `message` with a hex private key, personal-sign style.
fn sign(private_key_hex: &str, message: &str) -> Result<String, String> {
    let digits = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
    let bytes = zeroize::Zeroizing::new(
        hex::decode(digits).map_err(|e| format!("Invalid private key hex: {}", e))?,
    );
    let key = SigningKey::from_slice(&bytes).map_err(|e| format!("Invalid private key: {}", e))?;

    verify::sign_personal(&key, message.as_bytes()).map_err(|e| e.to_string())
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  walletauth                      Run the server");
    eprintln!("  walletauth keygen               Generate a private key and its address");
    eprintln!("  walletauth sign <key> <nonce>   Sign a nonce for /signin");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  walletauth keygen");
    eprintln!("  curl -X POST localhost:8001/register -d '{{\"address\":\"<address>\"}}'");
    eprintln!("  curl localhost:8001/users/<address>/nonce");
    eprintln!("  walletauth sign <key> <nonce>");
}

#[tokio::main]
async fn main() {
    // Check for subcommands
    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(String::as_str) {
        None => {}
        Some("keygen") if args.len() == 2 => {
            match keygen() {
                Ok((private_key, address)) => {
                    println!("private key: {}", private_key);
                    println!("address:     {}", address);
                }
                Err(e) => {
                    eprintln!("Error generating key: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some("sign") if args.len() == 4 => {
            match sign(&args[2], &args[3]) {
                Ok(signature) => println!("{}", signature),
                Err(e) => {
                    eprintln!("Error signing: {}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        Some(_) => {
            print_usage();
            std::process::exit(1);
        }
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    };
    tracing::info!(?config, "Starting walletauth");

    // One registry for the life of the process
    let state = AppState::from_config(&config);
    tracing::info!(
        issuer = %config.jwt_issuer,
        ttl_secs = state.tokens.ttl().num_seconds(),
        "Token provider configured"
    );

    // Any origin may call the API (wallet front-ends are served elsewhere).
    let cors = CorsLayer::permissive();

    let app = routes::api_router()
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors)
        .with_state(state);

    // Bind to configured address
    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %config.bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
