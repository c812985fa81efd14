// src/settings/io.rs
use directories_next::ProjectDirs;
use std::fs;
use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::AppSettings;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "RecordDesk";
const APPLICATION: &str = "RecordDesk";
const CONFIG_FILE: &str = "settings.json";

pub fn config_path() -> io::Result<PathBuf> {
    let proj_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION).ok_or_else(|| {
        io::Error::new(ErrorKind::NotFound, "Could not determine project directories for settings.")
    })?;
    let config_dir = proj_dirs.config_dir();
    fs::create_dir_all(config_dir)?;
    Ok(config_dir.join(CONFIG_FILE))
}

/// Settings file, then `.env` and process environment on top.
pub fn load() -> io::Result<AppSettings> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Settings: loaded environment from {:?}", path);
    }
    let mut settings = load_from(&config_path()?)?;
    settings.apply_env(|key| std::env::var(key).ok());
    Ok(settings)
}

pub fn load_from(path: &Path) -> io::Result<AppSettings> {
    info!("Settings: reading {:?}", path);
    match fs::File::open(path) {
        Ok(file) => serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            error!("Settings: failed to parse {:?}: {}", path, e);
            io::Error::new(ErrorKind::InvalidData, format!("Failed to parse settings file: {}", e))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Settings: {:?} not found, using defaults.", path);
            Ok(AppSettings::default())
        }
        Err(e) => {
            error!("Settings: failed to open {:?}: {}", path, e);
            Err(e)
        }
    }
}

pub fn save(settings: &AppSettings) -> io::Result<PathBuf> {
    let path = config_path()?;
    save_to(settings, &path)?;
    Ok(path)
}

pub fn save_to(settings: &AppSettings, path: &Path) -> io::Result<()> {
    info!("Settings: saving to {:?}", path);
    let writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(writer, settings).map_err(|e| {
        error!("Settings: failed to serialize to {:?}: {}", path, e);
        io::Error::other(e)
    })
}
