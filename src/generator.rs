use std::fs;
use std::path::Path;

use anyhow::Context;
use image::RgbImage;
use log::{debug, info, warn};

use crate::card::{render_card, Brand};
use crate::fonts::FontSet;
use crate::layout::LayoutMetrics;
use crate::metadata::parse_front_matter;

/// Fixed output file name inside each page bundle. Its existence is the
/// "already generated" marker; regeneration requires deleting it by hand.
pub(crate) const OUTPUT_NAME: &str = "og.png";

const INDEX_NAME: &str = "index.md";

#[derive(Debug, Default)]
pub(crate) struct RunStats {
    pub generated: usize,
    /// Posts that hit an unexpected error (read or render failure). Parse
    /// misses and missing titles are skips, not failures.
    pub failed: usize,
}

enum Outcome {
    Generated,
    NoMetadata,
    NoTitle,
}

/// Walks the direct children of `content_dir` and generates one card per
/// page bundle that lacks one. Errors in a single bundle are isolated: they
/// are logged, counted, and the batch continues.
pub(crate) fn generate(
    content_dir: &Path,
    brand: &Brand,
    metrics: &LayoutMetrics,
    fonts: &FontSet,
    avatar: Option<&RgbImage>,
) -> anyhow::Result<RunStats> {
    let mut stats = RunStats::default();

    let mut entries = fs::read_dir(content_dir)
        .with_context(|| format!("while reading {}", content_dir.display()))?
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            let index_path = path.join(INDEX_NAME);
            if !index_path.exists() {
                continue;
            }
            let output_path = path.join(OUTPUT_NAME);
            if output_path.exists() {
                debug!("Exists: {}", rel(&output_path, content_dir).display());
                continue;
            }
            match process_bundle(&index_path, &output_path, brand, metrics, fonts, avatar) {
                Ok(Outcome::Generated) => {
                    stats.generated += 1;
                    info!("Generated: {}", rel(&output_path, content_dir).display());
                }
                Ok(Outcome::NoMetadata) => {
                    info!("Skipped (no front matter): {}", rel(&index_path, content_dir).display());
                }
                Ok(Outcome::NoTitle) => {
                    info!("Skipped (no title): {}", rel(&index_path, content_dir).display());
                }
                Err(e) => {
                    stats.failed += 1;
                    warn!("Failed: {}: {e:#}", rel(&index_path, content_dir).display());
                }
            }
        } else if path.extension().is_some_and(|ext| ext == "md") {
            // Standalone posts are never auto-converted into bundles.
            info!("Skipped (not a bundle): {}", entry.file_name().to_string_lossy());
        }
    }

    Ok(stats)
}

fn process_bundle(
    index_path: &Path,
    output_path: &Path,
    brand: &Brand,
    metrics: &LayoutMetrics,
    fonts: &FontSet,
    avatar: Option<&RgbImage>,
) -> anyhow::Result<Outcome> {
    let content = fs::read_to_string(index_path)
        .with_context(|| format!("while reading {}", index_path.display()))?;
    let Some(meta) = parse_front_matter(&content) else {
        return Ok(Outcome::NoMetadata);
    };
    if meta.title.is_empty() {
        return Ok(Outcome::NoTitle);
    }
    render_card(&meta, brand, metrics, fonts, avatar, output_path)?;
    Ok(Outcome::Generated)
}

fn rel<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::load_fonts;
    use std::path::PathBuf;

    struct Fixture {
        dir: tempfile::TempDir,
        brand: Brand,
        metrics: LayoutMetrics,
        fonts: FontSet,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: tempfile::tempdir().unwrap(),
                brand: Brand::default(),
                metrics: LayoutMetrics::default(),
                fonts: load_fonts().unwrap(),
            }
        }

        fn bundle(&self, slug: &str, content: &str) -> PathBuf {
            let dir = self.dir.path().join(slug);
            fs::create_dir(&dir).unwrap();
            fs::write(dir.join(INDEX_NAME), content).unwrap();
            dir
        }

        fn run(&self) -> RunStats {
            generate(self.dir.path(), &self.brand, &self.metrics, &self.fonts, None).unwrap()
        }
    }

    fn post(title_line: &str, body: &str) -> String {
        format!("---\n{title_line}\ndescription: \"A short post\"\n---\n{body}")
    }

    #[test]
    fn generates_once_and_never_overwrites() {
        let fx = Fixture::new();
        let body = (1..=400).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let bundle = fx.bundle("hello-world", &post("title: \"Hello World\"", &body));

        let stats = fx.run();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.failed, 0);
        let out = bundle.join(OUTPUT_NAME);
        assert!(out.exists());

        // Second run is a no-op for the existing card.
        let before = fs::read(&out).unwrap();
        let stats = fx.run();
        assert_eq!(stats.generated, 0);
        assert_eq!(fs::read(&out).unwrap(), before);
    }

    #[test]
    fn document_without_markers_yields_nothing() {
        let fx = Fixture::new();
        let bundle = fx.bundle("plain", "No front matter here, just text.\n");
        let stats = fx.run();
        assert_eq!(stats.generated, 0);
        assert_eq!(stats.failed, 0);
        assert!(!bundle.join(OUTPUT_NAME).exists());
    }

    #[test]
    fn missing_title_skips_the_bundle() {
        let fx = Fixture::new();
        let bundle = fx.bundle("untitled", "---\ndescription: \"only\"\n---\nbody");
        let stats = fx.run();
        assert_eq!(stats.generated, 0);
        assert_eq!(stats.failed, 0);
        assert!(!bundle.join(OUTPUT_NAME).exists());
    }

    #[test]
    fn standalone_documents_are_left_alone() {
        let fx = Fixture::new();
        fs::write(fx.dir.path().join("legacy.md"), post("title: Legacy", "body")).unwrap();
        let stats = fx.run();
        assert_eq!(stats.generated, 0);
        assert!(!fx.dir.path().join("legacy").exists());
        assert!(!fx.dir.path().join(OUTPUT_NAME).exists());
    }

    #[test]
    fn one_broken_bundle_does_not_abort_the_batch() {
        let fx = Fixture::new();
        // Invalid UTF-8 makes the read itself fail.
        let broken = fx.dir.path().join("broken");
        fs::create_dir(&broken).unwrap();
        fs::write(broken.join(INDEX_NAME), [0xff, 0xfe, 0xfd]).unwrap();
        let good = fx.bundle("working", &post("title: Works", "body"));

        let stats = fx.run();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.failed, 1);
        assert!(good.join(OUTPUT_NAME).exists());
        assert!(!broken.join(OUTPUT_NAME).exists());
    }

    #[test]
    fn bundles_without_index_are_ignored() {
        let fx = Fixture::new();
        fs::create_dir(fx.dir.path().join("resources-only")).unwrap();
        let stats = fx.run();
        assert_eq!(stats.generated, 0);
        assert_eq!(stats.failed, 0);
    }
}
