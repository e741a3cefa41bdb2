use chrono::{Duration, Utc};
use clap::Parser;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};
use uuid::Uuid;

const NAME_IDENTIFIER_CLAIM: &str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
const ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

/// Mint an HS256 access token the API accepts.
///
/// Prints the token followed by ready-to-use request snippets for the three
/// places the API reads it from:
/// - hub query string (`/hubs/{hub}?access_token=...`)
/// - `access_token` header
/// - `access_token` cookie
#[derive(Parser, Debug)]
#[command(name = "token-gen", version, about)]
struct Args {
    /// Symmetric signing key (JWT_SECRET on the server)
    #[arg(long, env = "JWT_SECRET")]
    secret: String,

    /// Issuer (JWT_ISSUER on the server)
    #[arg(long, env = "JWT_ISSUER")]
    issuer: String,

    /// Audience (JWT_AUDIENCE on the server). Omitted when not given.
    #[arg(long, env = "JWT_AUDIENCE")]
    audience: Option<String>,

    /// Subject, written as the name identifier claim
    #[arg(long, default_value = "dev-user")]
    subject: String,

    /// Role claim value; repeat for several roles
    #[arg(long = "role", value_name = "ROLE")]
    roles: Vec<String>,

    /// Lifetime in seconds; 0 leaves out `exp`
    #[arg(long, default_value_t = 3600)]
    ttl: i64,

    /// Hub used for the printed query-string example
    #[arg(long, default_value = "chat")]
    hub: String,

    /// Print only the token
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

fn claims(args: &Args) -> Value {
    let now = Utc::now();
    let mut claims = Map::new();
    claims.insert("iss".to_string(), Value::String(args.issuer.clone()));
    claims.insert(
        NAME_IDENTIFIER_CLAIM.to_string(),
        Value::String(args.subject.clone()),
    );
    claims.insert("jti".to_string(), Value::String(Uuid::new_v4().to_string()));
    claims.insert("iat".to_string(), Value::from(now.timestamp()));
    claims.insert("nbf".to_string(), Value::from(now.timestamp()));

    if let Some(aud) = &args.audience {
        claims.insert("aud".to_string(), Value::String(aud.clone()));
    }
    if args.ttl > 0 {
        let exp = now + Duration::seconds(args.ttl);
        claims.insert("exp".to_string(), Value::from(exp.timestamp()));
    }
    if !args.roles.is_empty() {
        claims.insert(
            ROLE_CLAIM.to_string(),
            Value::Array(args.roles.iter().cloned().map(Value::String).collect()),
        );
    }

    Value::Object(claims)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims(&args),
        &EncodingKey::from_secret(args.secret.as_bytes()),
    )?;

    if args.quiet {
        println!("{}", token);
        return Ok(());
    }

    println!("token: {}", token);
    println!("subject: {}", args.subject);
    if args.roles.is_empty() {
        println!("roles: (none)");
    } else {
        println!("roles: {}", args.roles.join(", "));
    }
    println!();
    println!("query:  /hubs/{}?access_token={}", args.hub, token);
    println!("header: access_token: {}", token);
    println!("cookie: Cookie: access_token={}", token);

    Ok(())
}
