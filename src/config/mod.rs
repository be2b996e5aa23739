pub mod toml_config;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "pokedex-backend")]
#[command(about = "Identification backend for the Pokédex capture app")]
pub struct CliConfig {
    /// TOML 配置檔路徑
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Bind address override")]
    pub host: Option<String>,

    #[arg(long, help = "Listen port override")]
    pub port: Option<u16>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit JSON formatted logs")]
    pub log_json: bool,
}
