use chrono::Utc;
use clap::Subcommand;
use neuronote_core::auth::{self, TokenSigner};
use neuronote_core::{Config, Database};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Issue a session token for a user
    Issue {
        #[arg(long)]
        user: String,
    },
    /// Verify a session token
    Verify { token: String },
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let signer = TokenSigner::new(&config.auth.secret, config.auth.token_ttl_days);
    let db = Database::open()?;

    match action {
        AuthAction::Issue { user } => {
            let (token, claims) = signer.issue(&user)?;
            auth::store_session(&db, &token, &claims)?;
            println!(
                "{}",
                serde_json::json!({
                    "token": token,
                    "user_id": claims.user_id,
                    "expires_at": claims.expires_at,
                })
            );
        }
        AuthAction::Verify { token } => {
            let claims = auth::authenticate(&db, &signer, &token, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }
    Ok(())
}
