use clap::{Parser, Subcommand};
use circles::{CircleExtractor, Detector, ServerConfig, api, load_image};
use cli::{DetectionSummary, ParameterOverrides, open_in_viewer, save_extracted, save_rendered};
use color_eyre::eyre::Result;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect circles in an image file
    Detect {
        /// Path to the input image
        image: PathBuf,
        /// Where to save the annotated image
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Save every detected circle as its own PNG
        #[arg(short, long)]
        extract: bool,
        /// Directory for extracted circles
        #[arg(long, default_value = "extracted_circles")]
        extract_dir: PathBuf,
        #[command(flatten)]
        overrides: ParameterOverrides,
        /// Open the annotated image in the system viewer
        #[arg(long)]
        show: bool,
        /// Print a JSON summary instead of the text report
        #[arg(long)]
        json: bool,
        /// Also write the JSON summary to this file
        #[arg(long)]
        json_output: Option<PathBuf>,
    },
    /// Run the HTTP API
    Serve {
        /// Path to a .toml or .json server configuration
        #[arg(short, long, env = "CIRCLES_CONFIG")]
        config: Option<PathBuf>,
        #[arg(long, env = "CIRCLES_HOST")]
        host: Option<String>,
        #[arg(long, env = "CIRCLES_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            image,
            output,
            extract,
            extract_dir,
            overrides,
            show,
            json,
            json_output,
        } => {
            let extract_dir = extract.then_some(extract_dir.as_path());
            let summary = detect(&image, output, extract_dir, &overrides, show)?;
            if json {
                println!("{}", summary.to_json()?);
            } else {
                for line in summary.report() {
                    println!("{line}");
                }
            }
            if let Some(path) = json_output {
                summary.to_json_file(&path)?;
                info!("Summary written to {:?}", path);
            }
        }
        Commands::Serve { config, host, port } => {
            let mut server_config = match config {
                Some(path) => {
                    info!("Loading configuration from {:?}", path);
                    ServerConfig::from_file(&path)?
                }
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                server_config.host = host;
            }
            if let Some(port) = port {
                server_config.port = port;
            }
            api::serve(server_config).await?;
        }
    }

    Ok(())
}

fn detect(
    image_path: &Path,
    output: Option<PathBuf>,
    extract_dir: Option<&Path>,
    overrides: &ParameterOverrides,
    show: bool,
) -> Result<DetectionSummary> {
    let params = overrides.apply(Default::default())?;
    info!("Detecting circles in {:?}", image_path);

    let image = load_image(image_path)?;
    let detector = Detector::builder().with_median_blur(2).with_params(params).build();
    let result = detector.detect(&image)?;

    let mut summary = DetectionSummary::new(image_path.to_path_buf(), params, result);

    if output.is_some() || show {
        let rendered = circles::Renderer::default().render(&image, &summary.result);
        let target = output.clone().unwrap_or_else(|| std::env::temp_dir().join("circles_detected.png"));
        save_rendered(&target, &rendered)?;
        info!("Annotated image saved to {:?}", target);

        if show {
            if let Err(e) = open_in_viewer(&target) {
                warn!("Could not open image viewer: {}", e);
            }
        }
        summary.output = output;
    }

    if let Some(dir) = extract_dir {
        if summary.result.is_empty() {
            warn!("Nothing to extract");
        } else {
            let crops = CircleExtractor::default().extract(&image, &summary.result);
            summary.extracted = save_extracted(dir, &crops)?;
            info!("Extracted {} circles to {:?}", summary.extracted.len(), dir);
        }
    }

    Ok(summary)
}
