//! uiforge CLI - generate UI components from prompts and preview them.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "uiforge")]
#[command(about = "Generate, preview and publish UI components from prompts")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to uiforge.toml config file
    #[arg(short, long, default_value = "uiforge.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create uiforge.toml and starter components
    Init {
        /// Overwrite existing files
        #[arg(short, long)]
        yes: bool,
    },

    /// Start the development server with live preview
    Dev {
        /// Port to listen on (defaults to config or 7777)
        #[arg(short, long)]
        port: Option<u16>,

        /// Component file to preview on every change
        #[arg(short, long)]
        watch: Option<PathBuf>,

        /// Do not open browser
        #[arg(long)]
        no_open: bool,
    },

    /// Render every component in a directory into a static gallery
    Build {
        /// Component directory (defaults to config or "pages")
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory (defaults to config or "dist")
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip minification
        #[arg(long)]
        no_minify: bool,
    },

    /// Serve a built gallery
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// Directory to serve
        #[arg(short, long, default_value = "dist")]
        dir: PathBuf,
    },

    /// Render one component file to HTML
    Preview {
        /// Component source file
        file: PathBuf,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Props as a JSON object
        #[arg(long)]
        props: Option<String>,

        /// Print only the component markup
        #[arg(long)]
        fragment: bool,
    },

    /// Generate a component from a prompt and preview it
    Generate {
        /// What to build
        prompt: String,

        /// Files to send as context (text or images)
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Where to write the generated source
        #[arg(short, long, default_value = "preview.jsx")]
        out: PathBuf,

        /// Also write a rendered HTML document
        #[arg(long)]
        html: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(&cli.config)?;

    // Execute command
    match cli.command {
        Commands::Init { yes } => {
            commands::init::run(&cli.config, yes).await?;
        }
        Commands::Dev {
            port,
            watch,
            no_open,
        } => {
            commands::dev::run(&config, port, watch, !no_open).await?;
        }
        Commands::Build {
            source,
            output,
            no_minify,
        } => {
            let minify = if no_minify { Some(false) } else { None };
            commands::build::run(&config, source, output, minify).await?;
        }
        Commands::Serve { port, dir } => {
            commands::serve::run(port, dir).await?;
        }
        Commands::Preview {
            file,
            out,
            props,
            fragment,
        } => {
            commands::preview::run(&config, &file, out, props.as_deref(), fragment).await?;
        }
        Commands::Generate {
            prompt,
            attach,
            out,
            html,
        } => {
            commands::generate::run(&config, &prompt, &attach, &out, html).await?;
        }
    }

    Ok(())
}
