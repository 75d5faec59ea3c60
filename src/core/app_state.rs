//! Emulator context
//!
//! Bundles one database and one auth stub built from a [`Config`]. Tests
//! construct their own `Emulator` for isolation; client code that expects
//! process-wide handles goes through [`Emulator::global`].

use crate::constants::DEFAULT_CONFIG_FILE;
use crate::core::config::{load_config_or_default, Config};
use crate::core::error::Result;
use crate::database::Database;
use crate::fixtures;
use crate::security::Auth;
use crate::{log_error, log_info};
use once_cell::sync::Lazy;

/// Central state holding the emulated services
pub struct Emulator {
    /// Configuration the emulator was built from
    config: Config,

    /// Realtime database
    database: Database,

    /// Auth stub
    auth: Auth,
}

impl Emulator {
    /// Build an emulator seeded with the built-in fixtures
    pub fn new(config: Config) -> Self {
        let emulator = Self::build(config);
        emulator.seed_builtin();
        emulator
    }

    fn build(config: Config) -> Self {
        Self {
            database: Database::new(),
            auth: Auth::new(&config.auth),
            config,
        }
    }

    /// Validate `config`, build an emulator and seed it from the configured
    /// seed file when one is set
    pub fn init(config: Config) -> Result<Self> {
        config.validate()?;
        let emulator = Self::build(config);
        emulator.reset()?;
        log_info!("Emulator initialized");
        Ok(emulator)
    }

    /// Restore the initial state: re-seed the database and sign out.
    ///
    /// Database listeners survive and observe the new data. Auth observers
    /// are dropped.
    pub fn reset(&self) -> Result<()> {
        self.auth.reset();
        match &self.config.database.seed_file {
            Some(file) => self.database.initialize_from_file(file),
            None => self
                .database
                .initialize(fixtures::default_seed(self.config.database.connected)?),
        }
    }

    fn seed_builtin(&self) {
        let seeded = fixtures::default_seed(self.config.database.connected)
            .and_then(|seed| self.database.initialize(seed));
        if let Err(e) = seeded {
            log_error!("Failed to seed built-in fixtures: {}", e);
        }
    }

    /// The process-wide emulator, configured from `massive-stub.toml` when
    /// present and `MS_*` variables
    pub fn global() -> &'static Emulator {
        static INSTANCE: Lazy<Emulator> = Lazy::new(|| {
            let file = std::path::Path::new(DEFAULT_CONFIG_FILE)
                .exists()
                .then_some(DEFAULT_CONFIG_FILE);
            let mut config = load_config_or_default(file);
            if file.is_none() {
                if let Err(e) = config.apply_env_overrides() {
                    log_error!("Ignoring environment overrides: {}", e);
                }
            }
            match Emulator::init(config) {
                Ok(emulator) => emulator,
                Err(e) => {
                    log_error!("Emulator init failed, using built-in fixtures: {}", e);
                    Emulator::new(Config::default())
                }
            }
        });
        &INSTANCE
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The database
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The auth stub
    pub fn auth(&self) -> &Auth {
        &self.auth
    }
}
