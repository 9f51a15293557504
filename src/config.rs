use std::net::{IpAddr, Ipv4Addr};

use clap::Args;

pub const DEFAULT_LOG_FILTER: &str = "info,fire_projection=debug";

/// Accepted values for a pinned start year.
pub const START_YEAR_RANGE: std::ops::RangeInclusive<i64> = 1900..=9999;

/// HTTP server settings. Every flag can also come from the environment.
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[arg(long, env = "FIRE_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,
    #[arg(long, env = "FIRE_PORT", default_value_t = 8080)]
    pub port: u16,
    #[arg(
        long,
        env = "FIRE_START_YEAR",
        value_parser = clap::value_parser!(i32).range(START_YEAR_RANGE),
        help = "Calendar year of the first projected row; defaults to the current year"
    )]
    pub start_year: Option<i32>,
}
