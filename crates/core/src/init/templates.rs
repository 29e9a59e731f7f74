//! Starter configuration files embedded at compile time.
//!
//! With the `debug-embed` feature the files are still embedded in debug
//! builds, so tests see exactly what a release binary ships.

use rust_embed::RustEmbed;

/// Files under `crates/core/templates/`.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/templates"]
pub struct TemplateAssets;

/// Template content by path relative to the templates root, e.g.
/// `"runners/heartbeat.yaml"`.
///
/// ```
/// use conduit_core::init::templates::get_template;
///
/// let config = get_template("config.toml").expect("config.toml should exist");
/// assert!(config.contains("shutdown_timeout_secs"));
/// ```
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// Template paths starting with `prefix`, sorted.
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}
