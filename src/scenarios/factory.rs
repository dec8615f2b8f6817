use anyhow::{bail, Result};

use crate::network::Net;

use super::{burglary, grass_wetness};

pub const SCENARIO_NAMES: [&str; 2] = ["grass_wetness", "burglary"];

/// Builds one of the bundled example networks.
pub fn scenario_by_name(name: &str) -> Result<Net> {
    let net = match name {
        "grass_wetness" => grass_wetness::build()?,
        "burglary" => burglary::build()?,
        _ => bail!("Unknown scenario '{}' (known: {})", name, SCENARIO_NAMES.join(", ")),
    };
    Ok(net)
}
