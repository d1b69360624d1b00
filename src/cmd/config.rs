//! Configuration view and validation commands (`lipcoder config`).

use anyhow::Result;

use super::super::ConfigCommands;

pub fn cmd_config(project_dir: &std::path::Path, command: Option<ConfigCommands>) -> Result<()> {
    use lipcoder::config::{CONFIG_DIR, CONFIG_FILE, LipcoderConfig, LipcoderToml};

    let config_dir = project_dir.join(CONFIG_DIR);
    let config_path = config_dir.join(CONFIG_FILE);

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("Lipcoder Configuration");
            println!("======================");
            println!();

            let toml = if config_path.exists() {
                println!("Config file: {}", config_path.display());
                LipcoderToml::load(&config_path)?
            } else {
                println!("No lipcoder.toml found at {}", config_path.display());
                println!("Using default configuration.");
                LipcoderToml::default()
            };
            println!();
            print_toml(&toml);

            println!("Effective values (with env/CLI overrides):");
            let config = LipcoderConfig::new(project_dir.to_path_buf())?;
            println!("  model = \"{}\"", config.model());
            println!("  endpoint = \"{}\"", config.toml.endpoint());
            println!(
                "  api_key = {}",
                if config.toml.api_key().is_some() {
                    format!("set (${})", config.toml.llm.api_key_env)
                } else {
                    format!("not set (${})", config.toml.llm.api_key_env)
                }
            );
            println!();

            if !config_path.exists() {
                println!("Run 'lipcoder config init' to create a lipcoder.toml file.");
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No lipcoder.toml found. Using defaults (valid).");
                return Ok(());
            }

            let toml = LipcoderToml::load(&config_path)?;
            let warnings = toml.validate();

            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!("lipcoder.toml already exists at {}", config_path.display());
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config_dir.exists() {
                std::fs::create_dir_all(&config_dir)?;
            }

            LipcoderToml::default().save(&config_path)?;

            println!("Created lipcoder.toml at {}", config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [llm] provider, model, endpoint, api_key_env");
            println!("  - [context] token budget and large file threshold");
            println!("  - [review] auto_apply and its delay");
            println!();
        }
    }

    Ok(())
}

fn print_toml(toml: &lipcoder::config::LipcoderToml) {
    println!("[llm]");
    println!("  provider = \"{}\"", toml.llm.provider);
    println!("  model = \"{}\"", toml.llm.model);
    println!("  endpoint = \"{}\"", toml.llm.endpoint);
    println!("  api_key_env = \"{}\"", toml.llm.api_key_env);
    println!("  timeout_secs = {}", toml.llm.timeout_secs);
    println!("  temperature = {}", toml.llm.temperature);
    println!();

    println!("[context]");
    println!("  max_prompt_tokens = {}", toml.context.max_prompt_tokens);
    println!(
        "  reserved_response_tokens = {}",
        toml.context.reserved_response_tokens
    );
    println!(
        "  system_overhead_tokens = {}",
        toml.context.system_overhead_tokens
    );
    println!("  chars_per_token = {}", toml.context.chars_per_token);
    println!("  large_file_lines = {}", toml.context.large_file_lines);
    println!();

    println!("[review]");
    println!("  auto_apply = {}", toml.review.auto_apply);
    println!("  auto_apply_delay_ms = {}", toml.review.auto_apply_delay_ms);
    println!();
}
