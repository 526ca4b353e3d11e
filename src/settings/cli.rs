use super::Parser;

#[derive(Parser, Debug)]
pub struct Cli {
    /// Path to a settings TOML; defaults to settings/dev.toml (debug builds)
    /// or settings/release.toml.
    #[arg(long)]
    pub settings: Option<String>,

    /// Overrides `http.address` from the settings file.
    #[arg(long)]
    pub address: Option<String>,
}
