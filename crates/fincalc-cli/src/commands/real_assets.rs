use clap::Args;
use serde_json::Value;

use fincalc_core::real_assets::real_estate::{self, RealEstateInput};

use crate::input;

/// Arguments for a buy-to-let projection
#[derive(Args)]
pub struct RealEstateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_real_estate(args: RealEstateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(re_input) = input::read_input::<RealEstateInput>(args.input.as_deref())? else {
        return Err("--input <file.json> or stdin required for real estate".into());
    };
    let result = real_estate::project_real_estate(&re_input)?;
    Ok(serde_json::to_value(result)?)
}
