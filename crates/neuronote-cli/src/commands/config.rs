use clap::Subcommand;
use neuronote_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get a configuration value by dotted key
    Get { key: String },
    /// Set a configuration value by dotted key
    Set { key: String, value: String },
    /// Print the configuration file path
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load_or_default();
            match config.get_value(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown config key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default();
            config.set_value(&key, &value)?;
            config.save()?;
            println!("{key} = {value}");
        }
        ConfigAction::Path => {
            println!("{}", Config::path()?.display());
        }
    }
    Ok(())
}
