use std::path::PathBuf;

use anyhow::bail;
use clap::{command, Arg};
use log::info;

use card::Brand;
use layout::LayoutMetrics;

mod card;
mod fonts;
mod generator;
mod layout;
mod metadata;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = command!()
        .about("Generate OG images for blog posts that don't already have one")
        .args(&[
            Arg::new("content_dir")
                .help("Directory containing post bundles")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("content/post"),
            Arg::new("avatar")
                .long("avatar")
                .help("Author avatar image; the footer row is omitted when it is missing")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("assets/avatar.png"),
        ])
        .get_matches();

    let content_dir: &PathBuf = matches.get_one("content_dir").unwrap();
    if !content_dir.exists() || !content_dir.is_dir() {
        bail!("content_dir must be a directory.");
    }
    let avatar_path: &PathBuf = matches.get_one("avatar").unwrap();

    let brand = Brand::default();
    let metrics = LayoutMetrics::default();
    let fonts = fonts::load_fonts()?;
    let avatar = card::load_avatar(avatar_path, metrics.avatar_size);

    let stats = generator::generate(content_dir, &brand, &metrics, &fonts, avatar.as_ref())?;

    info!("Generated {} OG image(s)", stats.generated);
    if stats.failed > 0 {
        bail!("{} post(s) could not be processed; see warnings above", stats.failed);
    }
    Ok(())
}
