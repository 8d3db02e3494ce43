use anyhow::Result;
use clap::{Parser, Subcommand};
use iconize::{command, ServeArgs};
use iconpack::Compression;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
    tracing_log::LogTracer::init().ok();
    let env = std::env::var("ICONIZE_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_span_events(FmtSpan::ACTIVE | FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::new(env))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log_panics::init();
    let args = Args::parse();
    args.command.run()
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the upload form and the iconize endpoint
    Serve {
        #[clap(flatten)]
        args: ServeArgs,
    },
    /// Resize a local image into every icon size and write the zip archive
    Pack {
        /// Source image
        image: PathBuf,
        /// Archive to write, defaults to `<name>.icon.zip`
        #[clap(short, long)]
        output: Option<PathBuf>,
        /// Compression of the archive entries: stored or deflated
        #[clap(long, default_value = "deflated")]
        compression: Compression,
    },
}

impl Commands {
    pub fn run(self) -> Result<()> {
        match self {
            Self::Serve { args } => command::serve(&args)?,
            Self::Pack {
                image,
                output,
                compression,
            } => {
                let output = command::pack(&image, output.as_deref(), compression)?;
                println!("{}", output.display());
            }
        }
        Ok(())
    }
}
