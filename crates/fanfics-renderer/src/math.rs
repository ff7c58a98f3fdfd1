//! TeX → MathML for math blocks, via pulldown-latex

use pulldown_latex::{
    Parser, Storage, config::DisplayMode, config::RenderConfig, mathml::push_mathml,
};

/// Render a display-mode TeX block to MathML.
///
/// Returns the parser's error messages joined with `; ` when the source does
/// not parse, so the caller can fall back to the preformatted source.
pub fn render_mathml(tex: &str) -> Result<String, String> {
    let storage = Storage::new();
    let parser = Parser::new(tex, &storage);
    let config = RenderConfig {
        display_mode: DisplayMode::Block,
        ..Default::default()
    };

    let events: Vec<_> = parser.collect();
    let errors: Vec<String> = events
        .iter()
        .filter_map(|e| e.as_ref().err().map(|err| err.to_string()))
        .collect();
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }

    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config).map_err(|e| e.to_string())?;
    Ok(mathml)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fraction() {
        let mathml = render_mathml(r"\frac{a}{b}").unwrap();
        assert!(mathml.contains("<math"));
        assert!(mathml.contains("<mfrac"));
    }

    #[test]
    fn reports_unclosed_group() {
        let message = render_mathml(r"\frac{a").unwrap_err();
        assert!(!message.is_empty());
    }
}
