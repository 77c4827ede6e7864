use clap::Parser;

mod api;
mod canvas;
mod cli;
mod fonts;
mod layout;
mod render;
mod sink;

use canvas::Canvas;
use cli::Cli;
use fonts::FontSet;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();
    let fonts = FontSet::resolve()?;

    let payload = api::load(&args.payload_source()).await;
    let ops = layout::plan(&payload, &fonts);
    log::debug!("Planned {} draw operations", ops.len());

    let mut canvas = Canvas::new();
    render::rasterize(&ops, &fonts, &mut canvas)?;
    log::debug!("Rendered {} ink pixels", canvas.ink_count());

    for sink in args.sinks() {
        sink.present(&canvas)?;
    }
    Ok(())
}
