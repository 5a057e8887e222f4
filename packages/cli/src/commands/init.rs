use anyhow::Result;
use clap::Args;
use colored::Colorize;
use designer_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory holding stored designs
    #[arg(short, long, default_value = ".designer")]
    pub storage_dir: String,

    /// Published-design service URL
    #[arg(long)]
    pub api_url: Option<String>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let config = EditorConfig {
        storage_dir: args.storage_dir,
        api_url: args.api_url,
        ..EditorConfig::default()
    };

    let storage_path = config.storage_path(cwd);
    if !storage_path.exists() {
        fs::create_dir_all(&storage_path)?;
        println!("  {} Created {}/", "✓".green(), config.storage_dir);
    }

    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    println!();
    println!("Next steps:");
    println!("  1. Run: designer new");
    println!("  2. Run: designer show \"my design\"");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            storage_dir: "designs".to_string(),
            api_url: Some("https://designs.example.com/api".to_string()),
            force: false,
        };

        init(args, dir.path()).unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.storage_dir, "designs");
        assert_eq!(config.api_url.as_deref(), Some("https://designs.example.com/api"));
        assert!(dir.path().join("designs").is_dir());
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "historyDepth": 3 }"#).unwrap();

        let args = InitArgs {
            storage_dir: ".designer".to_string(),
            api_url: None,
            force: false,
        };
        init(args, dir.path()).unwrap();

        assert_eq!(EditorConfig::load(dir.path()).unwrap().history_depth, 3);
    }
}
