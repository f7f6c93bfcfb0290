//! # Maqueta CLI
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! maqueta serve --listen 0.0.0.0:8080 --asset-dir assets --font-dir fonts
//!
//! # Render one mockup from a template file, without a server
//! maqueta render --template template.json --company "Acme Roofing, Inc." --out mockup.jpg
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use maqueta::{
    assets::AssetResolver,
    job::Mapping,
    render::{encode_jpeg, Renderer, COMPANY_NAME_VARIABLE},
    render::text::FontStore,
    rows::{Row, RowSet},
    server::{serve, ServerConfig},
    template::Template,
    MaquetaError,
};

/// Maqueta - batch mockup generation
#[derive(Parser, Debug)]
#[command(name = "maqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8080")]
        listen: String,

        /// Directory holding base images and stored masks
        #[arg(long, default_value = "assets")]
        asset_dir: String,

        /// Directory holding TTF/OTF fonts
        #[arg(long, default_value = "fonts")]
        font_dir: String,

        /// Directory for local result output
        #[arg(long, default_value = "output")]
        output_dir: String,

        /// Remote image host endpoint (empty = write results locally)
        #[arg(long, env = "MAQUETA_UPLOAD_ENDPOINT", default_value = "")]
        upload_endpoint: String,

        /// API key for the remote image host
        #[arg(long, env = "MAQUETA_UPLOAD_KEY", default_value = "")]
        upload_key: String,

        /// Timeout in seconds for outbound fetches and uploads
        #[arg(long, default_value_t = 15)]
        fetch_timeout: u64,
    },

    /// Render a single mockup to a file
    Render {
        /// Path to a template JSON file
        #[arg(long)]
        template: PathBuf,

        /// Company name fed to the template's variables
        #[arg(long)]
        company: String,

        /// Output JPEG path
        #[arg(long, default_value = "mockup.jpg")]
        out: PathBuf,

        /// Directory holding base images and stored masks
        #[arg(long, default_value = "assets")]
        asset_dir: String,

        /// Directory holding TTF/OTF fonts
        #[arg(long, default_value = "fonts")]
        font_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), MaquetaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maqueta=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            listen,
            asset_dir,
            font_dir,
            output_dir,
            upload_endpoint,
            upload_key,
            fetch_timeout,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                asset_dir,
                font_dir,
                output_dir,
                upload_endpoint,
                upload_api_key: upload_key,
                fetch_timeout_secs: fetch_timeout,
            };
            serve(config).await
        }

        Commands::Render {
            template,
            company,
            out,
            asset_dir,
            font_dir,
        } => render_one(template, &company, out, &asset_dir, &font_dir).await,
    }
}

/// One-shot render: a single synthetic row with the company name.
async fn render_one(
    template_path: PathBuf,
    company: &str,
    out: PathBuf,
    asset_dir: &str,
    font_dir: &str,
) -> Result<(), MaquetaError> {
    let json = std::fs::read_to_string(&template_path)?;
    let template: Template = serde_json::from_str(&json)
        .map_err(|e| MaquetaError::Storage(format!("invalid template JSON: {}", e)))?;

    let mut rows = RowSet::new(vec![COMPANY_NAME_VARIABLE.to_string()]);
    rows.rows.push(Row {
        cells: vec![company.to_string()],
    });
    let mapping = Mapping::from([(
        COMPANY_NAME_VARIABLE.to_string(),
        COMPANY_NAME_VARIABLE.to_string(),
    )]);

    let resolver = AssetResolver::new(asset_dir)?;
    let renderer = Arc::new(Renderer::new(FontStore::new(font_dir)));
    let prepared = renderer
        .prepare(&template, &rows, 0, &mapping, &resolver)
        .await?;

    let renderer_for_task = renderer.clone();
    let bytes = tokio::task::spawn_blocking(move || {
        let img = renderer_for_task.render(&template, prepared)?;
        encode_jpeg(&img)
    })
    .await
    .map_err(|e| MaquetaError::Image(format!("render task failed: {}", e)))??;

    std::fs::write(&out, bytes)?;
    println!("Wrote {}", out.display());
    Ok(())
}
