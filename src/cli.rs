use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "lazyroster", version, about = "TUI for managing a student roster")]
pub struct Args {
    /// API base URL; the collection lives at `{base_url}/students`
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Theme name (e.g., "Catppuccin Latte")
    #[arg(short, long)]
    pub theme: Option<String>,
}

impl Args {
    /// Overlay command-line values onto the loaded configuration.
    pub fn apply(&self, config: &mut crate::config::AppConfig) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url.clone_from(base_url);
        }
        if let Some(theme) = &self.theme {
            config.theme.name.clone_from(theme);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_cli_overrides_config() {
        let args = Args::parse_from([
            "lazyroster",
            "--base-url",
            "https://roster.example.com/api/v1",
            "--theme",
            "Catppuccin Latte",
        ]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.api.base_url, "https://roster.example.com/api/v1");
        assert_eq!(config.theme.name, "Catppuccin Latte");
        assert_eq!(config.ui.page_size, 50);
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::parse_from(["lazyroster"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.api.base_url, "http://localhost:8080/api/v1");
        assert!(args.config.is_none());
    }
}
