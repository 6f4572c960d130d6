//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigGetArgs, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::PathBuf;

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Get(get_args) => handle_config_get(get_args, config, output),
    }
}

fn init_target(args: &ConfigInitArgs) -> Result<PathBuf> {
    if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))
    } else {
        Ok(PathBuf::from(".dtomap.toml"))
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = init_target(&args)?;
    write_default_config(&path, args.force, output)
}

fn write_default_config(path: &std::path::Path, force: bool, output: &mut OutputWriter) -> Result<()> {
    if path.exists() && !force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match &config.source {
        Some(path) => output.debug(&format!("Loaded from {}", path.display()))?,
        None => output.debug("No config file found, showing defaults")?,
    }
    let content = config.render(args.format)?;
    output.writeln(content.trim_end())
}

/// Handle config get subcommand
fn handle_config_get(args: ConfigGetArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let value = config.get(&args.key)?;
    output.writeln(&value)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;
    use crate::cli::{ConfigFormat, OutputFormat};
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_defaults_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".dtomap.toml");

        let (mut out, buffer) = fixtures::writer(OutputFormat::Human);
        write_default_config(&path, false, &mut out).unwrap();
        assert_eq!(Config::from_file(&path).unwrap().engine, Config::default().engine);

        std::fs::write(&path, "[paths]\ncatalog = \"keep.yaml\"\n").unwrap();
        write_default_config(&path, false, &mut out).unwrap();
        assert!(buffer.contents().contains("already exists"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("keep.yaml"));

        write_default_config(&path, true, &mut out).unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("keep.yaml"));
    }

    #[test]
    fn test_show_and_get() {
        let mut config = Config::default();
        config.paths.catalog = Some(PathBuf::from("types.yaml"));

        let (mut out, buffer) = fixtures::writer(OutputFormat::Human);
        handle_config_show(ConfigShowArgs { format: ConfigFormat::Json }, &config, &mut out).unwrap();
        let shown: serde_json::Value = serde_json::from_str(&buffer.contents()).unwrap();
        assert_eq!(shown["paths"]["catalog"], "types.yaml");
        assert_eq!(shown["engine"]["absent_fields"], "null");

        let (mut out, buffer) = fixtures::writer(OutputFormat::Human);
        handle_config_get(
            ConfigGetArgs {
                key: "paths.catalog".to_string(),
            },
            &config,
            &mut out,
        )
        .unwrap();
        assert_eq!(buffer.contents(), "types.yaml\n");
    }
}
