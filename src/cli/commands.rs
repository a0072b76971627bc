use clap::Subcommand;

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Initialize the database and seed the super administrator, default school and plans
    Init {
        /// Data directory for the database, uploads and backups
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Skip interactive prompts (reads SUPERADMIN_EMAIL and SUPERADMIN_PASSWORD)
        #[arg(long)]
        non_interactive: bool,
    },

    /// Write a database snapshot into <data_dir>/backups
    Backup {
        /// Data directory for the database, uploads and backups
        #[arg(long, default_value = "./data")]
        data_dir: String,
    },
}
