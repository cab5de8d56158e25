//! The CLI surface for the ucdm settings file.
use crate::settings::{Settings, get_settings_file_path};
use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::Path;

/// The available subcommands for managing settings.
#[derive(Subcommand)]
pub enum SettingsSubcommands {
    /// Open the ucdm settings file in a text editor
    Edit,
    /// Print the path the settings file is read from
    Path,
    /// Print a placeholder `settings.toml` with every field documented
    DumpDefault,
}

impl SettingsSubcommands {
    /// Execute the supplied settings subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::Edit => {
                let file_path = get_settings_file_path();
                write_placeholder_if_missing(&file_path)?;

                println!(
                    "Opening the ucdm settings file for editing: {}",
                    file_path.display()
                );
                edit::edit_file(&file_path)?;
            }
            Self::Path => println!("{}", get_settings_file_path().display()),
            Self::DumpDefault => print!("{}", Settings::default_file_contents()),
        }

        Ok(())
    }
}

/// Seed the settings file (and its parent directory) with documented placeholder contents,
/// unless one already exists.
fn write_placeholder_if_missing(file_path: &Path) -> Result<()> {
    if file_path.is_file() {
        return Ok(());
    }

    if let Some(dir_path) = file_path.parent() {
        fs::create_dir_all(dir_path)
            .with_context(|| format!("Failed to create directory: {}", dir_path.display()))?;
    }

    fs::write(file_path, Settings::default_file_contents())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_placeholder_if_missing() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("config").join("settings.toml");

        write_placeholder_if_missing(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            Settings::default_file_contents()
        );

        // An existing file is left untouched
        fs::write(&file_path, "log_level = \"warn\"\n").unwrap();
        write_placeholder_if_missing(&file_path).unwrap();
        assert_eq!(
            fs::read_to_string(&file_path).unwrap(),
            "log_level = \"warn\"\n"
        );
    }
}
