use anyhow::{Ok, Result};

use super::config_model::{Database, DotEnvyConfig, Razorpay, Server};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .expect("SERVER_BODY_LIMIT is invalid")
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .expect("SERVER_TIMEOUT is invalid")
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    // Gateway credentials are required up front so a misconfigured deployment
    // fails at startup instead of on the first donation attempt.
    let razorpay = Razorpay {
        key_id: std::env::var("RAZORPAY_KEY_ID").expect("RAZORPAY_KEY_ID is invalid"),
        key_secret: std::env::var("RAZORPAY_KEY_SECRET").expect("RAZORPAY_KEY_SECRET is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        razorpay,
    })
}
