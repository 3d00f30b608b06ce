use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod scenario;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use scenario::ScenarioParameters;
pub use settings::{Account, Analytics, Settings};

/// Loads the application configuration from `config.toml`, falling back to
/// built-in defaults when the file is absent.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::with_name("config").required(false))
        .build()?;

    let settings = builder.try_deserialize::<Settings>()?;
    Ok(settings)
}

/// Loads and validates a scenario parameter file (TOML).
///
/// This is the boundary where loosely-typed user input becomes a validated
/// `ScenarioParameters`; nothing past this point re-checks ranges.
pub fn load_scenario_params(path: &Path) -> Result<ScenarioParameters, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .build()?;

    let params = builder.try_deserialize::<ScenarioParameters>()?;
    params.validate()?;
    Ok(params)
}
