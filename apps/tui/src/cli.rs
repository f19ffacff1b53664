use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "wastemap",
    version,
    about = "Live density map of geotagged waste reports"
)]
pub struct CliArgs {
    /// Print report stats and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless stats as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Override BACKEND_URL (sqlite:<path> or http(s)://<project>)
    #[arg(long = "backend-url", value_name = "URL")]
    pub backend_url: Option<String>,

    /// Override MAP_STYLE (dark, light, dark-hires, light-hires)
    #[arg(long = "map-style", value_name = "STYLE")]
    pub map_style: Option<String>,

    /// Override LOG_FILE
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<String>,
}

impl CliArgs {
    /// Environment variables implied by the flags.
    pub fn overrides(&self) -> Vec<(&'static str, &str)> {
        [
            ("BACKEND_URL", self.backend_url.as_deref()),
            ("MAP_STYLE", self.map_style.as_deref()),
            ("LOG_FILE", self.log_file.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key, value)))
        .collect()
    }

    /// Flags beat `.env` and the inherited environment.
    pub fn apply_env_overrides(&self) {
        for (key, value) in self.overrides() {
            std::env::set_var(key, value);
        }
    }

    pub const fn wants_headless(&self) -> bool {
        self.headless || self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn flags_become_env_overrides() {
        let args = CliArgs::try_parse_from([
            "wastemap",
            "--backend-url",
            "sqlite:reports.db",
            "--map-style",
            "light",
        ])
        .unwrap();

        assert_eq!(
            args.overrides(),
            vec![("BACKEND_URL", "sqlite:reports.db"), ("MAP_STYLE", "light")]
        );
        assert!(!args.wants_headless());
    }

    #[test]
    fn json_implies_headless() {
        let args = CliArgs::try_parse_from(["wastemap", "--json"]).unwrap();
        assert!(args.wants_headless());
        assert!(args.overrides().is_empty());
    }
}
