use std::path::PathBuf;

use clap::Parser;
use room_climate::config::StoreArgs;

#[derive(Debug, Parser)]
pub struct Args {
    /// Path to the YAML association config.
    #[arg(
        value_name = "CONFIG",
        env = "ROOM_ASSOC_CONFIG",
        default_value = "/config/room_assoc.yml"
    )]
    pub config: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,
}
