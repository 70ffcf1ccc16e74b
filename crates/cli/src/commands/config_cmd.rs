//! `devsquad config` — print the effective configuration.
//!
//! Debug formatting redacts API keys; the TOML dump below goes through a
//! scrubbed copy for the same reason.

use devsquad_config::AppConfig;

pub fn run(config: AppConfig) -> anyhow::Result<()> {
    let mut scrubbed = config;
    if scrubbed.llm.api_key.is_some() {
        scrubbed.llm.api_key = Some("[REDACTED]".into());
    }
    println!("{}", toml::to_string_pretty(&scrubbed)?);
    Ok(())
}
