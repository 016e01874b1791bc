/// The markup flavor a template is parsed and serialized in.
///
/// The mode decides three things: whether parsing is strict about
/// well-formedness (`is_validating`), whether the source is first run
/// through the tag-soup normalizer (`is_legacy`), and whether the output
/// is subject to the web minimization rules that forbid collapsing
/// elements like `<div></div>` into `<div/>` (`is_web`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TemplateMode {
    /// Well-formed XML, no output minimization restrictions.
    Xml,
    /// XML parsed with strict well-formedness enforcement.
    ValidXml,
    /// Well-formed XHTML.
    #[default]
    Xhtml,
    /// XHTML parsed with strict well-formedness enforcement.
    ValidXhtml,
    /// HTML5 written as well-formed markup.
    Html5,
    /// Tag-soup HTML5, normalized into a well-formed tree before parsing.
    LegacyHtml5,
}

impl TemplateMode {
    /// True when parsing should enforce strict well-formedness.
    pub fn is_validating(self) -> bool {
        matches!(self, TemplateMode::ValidXml | TemplateMode::ValidXhtml)
    }

    /// True for the web modes (XHTML/HTML5 family), which carry
    /// element-minimization restrictions on output.
    pub fn is_web(self) -> bool {
        !matches!(self, TemplateMode::Xml | TemplateMode::ValidXml)
    }

    /// True when the source must be normalized from tag-soup markup first.
    pub fn is_legacy(self) -> bool {
        matches!(self, TemplateMode::LegacyHtml5)
    }
}

impl std::fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TemplateMode::Xml => "XML",
            TemplateMode::ValidXml => "VALIDXML",
            TemplateMode::Xhtml => "XHTML",
            TemplateMode::ValidXhtml => "VALIDXHTML",
            TemplateMode::Html5 => "HTML5",
            TemplateMode::LegacyHtml5 => "LEGACYHTML5",
        };
        f.write_str(name)
    }
}

/// Elements whose empty form may legally be minimized in web output.
///
/// Everything else must be serialized with an explicit end tag: the XHTML
/// content model forbids `<div/>`, `<script/>`, `<textarea/>` and friends.
pub(crate) const MINIMIZABLE_WEB_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "link", "meta", "param", "source", "track", "wbr",
];

pub(crate) fn is_minimizable_web_element(normalized_name: &str) -> bool {
    MINIMIZABLE_WEB_ELEMENTS.contains(&normalized_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_predicates() {
        assert!(TemplateMode::ValidXml.is_validating());
        assert!(TemplateMode::ValidXhtml.is_validating());
        assert!(!TemplateMode::Xhtml.is_validating());

        assert!(TemplateMode::Xhtml.is_web());
        assert!(TemplateMode::Html5.is_web());
        assert!(TemplateMode::LegacyHtml5.is_web());
        assert!(!TemplateMode::Xml.is_web());

        assert!(TemplateMode::LegacyHtml5.is_legacy());
        assert!(!TemplateMode::Html5.is_legacy());
    }

    #[test]
    fn test_minimizable_elements() {
        assert!(is_minimizable_web_element("br"));
        assert!(is_minimizable_web_element("img"));
        assert!(!is_minimizable_web_element("div"));
        assert!(!is_minimizable_web_element("textarea"));
        assert!(!is_minimizable_web_element("script"));
    }
}
