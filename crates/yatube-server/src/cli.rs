use clap::{Parser, Subcommand};

/// Yatube - a small blogging platform.
#[derive(Parser)]
#[command(name = "yatube")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute; defaults to `serve`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve,

    /// Create a group posts can be published in
    CreateGroup {
        /// Unique URL slug, e.g. "lions"
        #[arg(long)]
        slug: String,

        /// Display title
        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,
    },
}
