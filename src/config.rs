use dotenv::dotenv;
use std::env;

use rust_decimal::Decimal;

use crate::matching_engine::DEFAULT_TICK_SIZE;

const BIND_ADDR: &str = "BIND_ADDR";
const MARKET_NAME: &str = "MARKET_NAME";
const TICK_SIZE: &str = "TICK_SIZE";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_MARKET_NAME: &str = "UNKNOWN/PAIR";

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub market_name: String,
    pub tick_size: Decimal,
}

impl Config {
    pub fn from_env() -> Config {
        // Load .env file
        dotenv().ok();

        let bind_addr =
            env::var(BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let market_name =
            env::var(MARKET_NAME).unwrap_or_else(|_| DEFAULT_MARKET_NAME.to_string());
        let tick_size = match env::var(TICK_SIZE) {
            Ok(raw) => raw
                .parse::<Decimal>()
                .unwrap_or_else(|_| panic!("failed to parse tick size: {}", raw)),
            Err(_) => DEFAULT_TICK_SIZE,
        };

        Config {
            bind_addr,
            market_name,
            tick_size,
        }
    }
}
