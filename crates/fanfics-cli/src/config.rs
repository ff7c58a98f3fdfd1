//! KDL overrides for the render and service configuration.
//!
//! ```kdl
//! web-base "https://bsky.app"
//! max-embed-depth 2
//! math "mathml"
//! blob-url-template "https://cdn.example/{did}/{cid}"
//! ```

use fanfics_renderer::{MathMode, RenderConfig, ServiceConfig};
use kdl::{KdlDocument, KdlValue};
use miette::{IntoDiagnostic, Result, WrapErr};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub render: RenderConfig,
    pub services: ServiceConfig,
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("fanfics").join("render.kdl"))
}

/// Load `path`, or the default location when `path` is `None`.
///
/// An explicit path must exist; a missing default file means defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                tracing::debug!("no config file, using defaults");
                return Ok(Config::default());
            }
        },
    };
    tracing::debug!(path = %path.display(), "loading config");
    let text = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {}", path.display()))?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Config> {
    let doc: KdlDocument = text.parse()?;
    let mut config = Config::default();

    let render = &mut config.render;
    if let Some(base) = string(&doc, "web-base")? {
        render.web_base = base;
    }
    if let Some(base) = string(&doc, "leaflet-base")? {
        render.leaflet_base = base;
    }
    if let Some(height) = integer(&doc, "iframe-default-height")? {
        render.iframe_default_height = height;
    }
    if let Some(depth) = integer(&doc, "max-list-depth")? {
        render.max_list_depth = depth;
    }
    if let Some(depth) = integer(&doc, "max-embed-depth")? {
        render.max_embed_depth = depth;
    }
    if let Some(math) = string(&doc, "math")? {
        render.math = match math.as_str() {
            "preformatted" => MathMode::Preformatted,
            "mathml" => MathMode::MathMl,
            other => {
                return Err(miette::miette!(
                    "math must be \"preformatted\" or \"mathml\", got {other:?}"
                ));
            }
        };
    }

    let services = &mut config.services;
    if let Some(template) = string(&doc, "blob-url-template")? {
        services.blob_url_template = template;
    }
    if let Some(service) = string(&doc, "record-service")? {
        services.record_service = service;
    }
    if let Some(plc) = string(&doc, "plc-directory")? {
        services.plc_directory = plc;
    }

    Ok(config)
}

fn value<'a>(doc: &'a KdlDocument, name: &str) -> Option<&'a KdlValue> {
    Some(doc.get(name)?.entries().first()?.value())
}

fn string(doc: &KdlDocument, name: &str) -> Result<Option<String>> {
    match value(doc, name) {
        None => Ok(None),
        Some(value) => value
            .as_string()
            .map(|s| Some(s.to_owned()))
            .ok_or_else(|| miette::miette!("{name} must be a string, got {value}")),
    }
}

fn integer<T: TryFrom<i64>>(doc: &KdlDocument, name: &str) -> Result<Option<T>> {
    match value(doc, name) {
        None => Ok(None),
        Some(value) => value
            .as_i64()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| miette::miette!("{name} must be a non-negative integer, got {value}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse(
            r#"
            web-base "https://social.example"
            iframe-default-height 300
            max-embed-depth 1
            math "mathml"
            blob-url-template "https://cdn.example/{did}/{cid}"
            "#,
        )
        .unwrap();
        assert_eq!(config.render.web_base, "https://social.example");
        assert_eq!(config.render.iframe_default_height, 300);
        assert_eq!(config.render.max_embed_depth, 1);
        assert_eq!(config.render.max_list_depth, 20);
        assert_eq!(config.render.math, MathMode::MathMl);
        assert_eq!(
            config.services.blob_url_template,
            "https://cdn.example/{did}/{cid}"
        );
        assert_eq!(config.services.plc_directory, "https://plc.directory");
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(parse("max-list-depth \"deep\"").is_err());
        assert!(parse("max-list-depth -1").is_err());
        assert!(parse("web-base 12").is_err());
        assert!(parse("math \"latex\"").is_err());
    }

    #[test]
    fn syntax_errors_are_reported() {
        assert!(parse("web-base \"unterminated").is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        assert!(load(Some(Path::new("/nonexistent/fanfics/render.kdl"))).is_err());
    }
}
