use anyhow::Context;
use base64::Engine as _;
use clap::Parser;
use printraster::platform::{DisplayMetrics, StaticEnvironment, WindowMetrics};
use printraster::rendering::BlockSurface;
use printraster::{CaptureConfig, InvalidDimensionPolicy, RenderHost};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Render an HTML document to a PNG for receipt printing
#[derive(Parser, Debug)]
#[command(name = "printraster", version, about)]
struct Args {
    /// HTML file to render; reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Settle delay after load completion, in milliseconds
    #[arg(short, long, default_value_t = 0.0)]
    duration: f64,

    /// Device pixel density
    #[arg(long, default_value_t = 1.0)]
    density: f64,

    /// Viewport width in device pixels
    #[arg(long, default_value_t = 576)]
    width: u32,

    /// Viewport height in device pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Output file; writes to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Emit base64 instead of raw PNG bytes
    #[arg(long)]
    base64: bool,

    /// Exit with an error instead of printing nothing when the content has no size
    #[arg(long)]
    fail_on_invalid: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let content = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };

    let env = Arc::new(StaticEnvironment::new(DisplayMetrics {
        density: args.density,
        window: WindowMetrics::Legacy {
            width: args.width,
            height: args.height,
        },
    }));
    let config = CaptureConfig {
        invalid_dimensions: if args.fail_on_invalid {
            InvalidDimensionPolicy::Fail
        } else {
            InvalidDimensionPolicy::Drop
        },
        ..Default::default()
    };

    let host = RenderHost::new(BlockSurface::factory(env.clone()), env, config).await?;
    let image = host.content_to_image(&content, Some(args.duration)).await;
    host.shutdown().await?;

    let Some(image) = image? else {
        log::warn!("nothing was captured");
        std::process::exit(2);
    };

    let payload = if args.base64 {
        let mut s = base64::engine::general_purpose::STANDARD.encode(image.bytes());
        s.push('\n');
        s.into_bytes()
    } else {
        image.into_bytes()
    };

    match &args.output {
        Some(path) => std::fs::write(path, &payload)
            .with_context(|| format!("writing {}", path.display()))?,
        None => std::io::stdout()
            .write_all(&payload)
            .context("writing stdout")?,
    }
    Ok(())
}
