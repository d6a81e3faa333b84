//! Static "Features" page describing what the engine offers.
//!
//! The page is a pure function of fixed content: a list of feature
//! descriptors rendered as cards, two benchmark comparison panels and the
//! entrance animation parameters attached to each block as data attributes.
//! Layout chrome is supplied by a [`PageShell`].

use std::fmt::{self, Write as _};

/// One feature card.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureDescriptor {
    /// Card heading.
    pub title: &'static str,
    /// Card body text.
    pub description: &'static str,
    /// Symbolic icon identifier.
    pub icon: &'static str,
    /// Symbolic image identifier.
    pub image: &'static str,
    /// Icon background tone.
    pub background: &'static str,
    /// Icon foreground tone.
    pub foreground: &'static str,
}

/// Features in render order.
pub const FEATURES: [FeatureDescriptor; 6] = [
    FeatureDescriptor {
        title: "AISC I-Beams and Rectangular Sections",
        description: "Render beams as physical shapes (I-beams, T-beams). Supports rigid end offsets, member releases, and cardinal insertion points.",
        icon: "box",
        image: "feature-1",
        background: "sky-100",
        foreground: "sky-600",
    },
    FeatureDescriptor {
        title: "The \"Glass Box\" Approach",
        description: "Inspect the raw 12x12 Stiffness Matrix [k], Transformation Matrix [T], and FEF vectors for any element. Perfect for education and verification.",
        icon: "eye",
        image: "feature-2",
        background: "green-100",
        foreground: "green-600",
    },
    FeatureDescriptor {
        title: "Interactive Graphics",
        description: "CAD-like snapping, box selection, and smooth 3D orbiting. Visualizes forces and moments with auto-scaling 3D arrows.",
        icon: "activity",
        image: "feature-3",
        background: "orange-100",
        foreground: "orange-600",
    },
    FeatureDescriptor {
        title: "Computed Fixed End Forces",
        description: "Automatically calculates fixed-end moments and shears for various load types on beam elements before analysis begins.",
        icon: "anchor",
        image: "feature-4",
        background: "purple-100",
        foreground: "purple-600",
    },
    FeatureDescriptor {
        title: "Exact Deformation Tracking",
        description: "Utilizes high-order shape functions to render precise displacement curves between nodes, accurate right down to the dot.",
        icon: "crosshair",
        image: "feature-3",
        background: "red-100",
        foreground: "red-600",
    },
    FeatureDescriptor {
        title: "Detailed Equilibrium Checks",
        description: "Get comprehensive reaction summaries for all supports to ensure global stability and verify that ΣF=0 and ΣM=0.",
        icon: "clipboard-list",
        image: "feature-6",
        background: "cyan-100",
        foreground: "cyan-600",
    },
];

/// Benchmark comparison block with a status badge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComparisonPanel {
    /// Result category shown as the panel heading.
    pub label: &'static str,
    /// Symbolic image identifier.
    pub image: &'static str,
    /// Alternative text of the image.
    pub alt: &'static str,
    /// Badge text.
    pub status: &'static str,
}

/// Comparison panels in render order.
pub const COMPARISON_PANELS: [ComparisonPanel; 2] = [
    ComparisonPanel {
        label: "Modal Analysis Results",
        image: "modal-analysis",
        alt: "Modal Analysis Comparison",
        status: "MATCH",
    },
    ComparisonPanel {
        label: "Linear Static Results",
        image: "linear-static",
        alt: "Linear Static Comparison",
        status: "MATCH",
    },
];

const PAGE_TITLE: &str = "Features";
const PAGE_INTRO: &str = "A complete toolkit for understanding structural analysis, built from the ground up for transparency and education.";
const VERIFICATION_TITLE: &str = "Verified Accuracy";
const VERIFICATION_INTRO: &str = "Benchmarked against industry-standard commercial software (SAP2000)";

/// Fade and slide into view when mounted.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entrance {
    /// Opacity before the animation.
    pub initial_opacity: f64,
    /// Vertical offset before the animation, in pixels.
    pub initial_y: f64,
    /// Opacity after the animation.
    pub final_opacity: f64,
    /// Vertical offset after the animation, in pixels.
    pub final_y: f64,
    /// Duration in seconds.
    pub duration: f64,
    /// Delay before starting, in seconds.
    pub delay: f64,
}

impl Entrance {
    /// Standard entrance after `delay` seconds.
    #[must_use]
    pub const fn after(delay: f64) -> Self {
        Self {
            initial_opacity: 0.0,
            initial_y: 20.0,
            final_opacity: 1.0,
            final_y: 0.0,
            duration: 0.5,
            delay,
        }
    }

    /// Entrance of the card at `index`, staggered by a tenth of a second.
    #[must_use]
    pub fn for_card(index: usize) -> Self {
        Self::after(index as f64 * 0.1)
    }
}

impl fmt::Display for Entrance {
    /// Render as HTML data attributes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data-initial-opacity=\"{}\" data-initial-y=\"{}\" data-final-opacity=\"{}\" data-final-y=\"{}\" data-duration=\"{}\" data-delay=\"{:.1}\"",
            self.initial_opacity,
            self.initial_y,
            self.final_opacity,
            self.final_y,
            self.duration,
            self.delay
        )
    }
}

/// Navigation, header and footer chrome around page content.
pub trait PageShell {
    /// Wrap `content` in the shell.
    fn frame(&self, title: &str, content: &str) -> String;
}

/// Minimal standalone HTML document.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultShell;

impl PageShell for DefaultShell {
    fn frame(&self, title: &str, content: &str) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\" />\n<title>{}</title>\n</head>\n<body>\n<nav class=\"site-nav\"></nav>\n<main>\n{}</main>\n<footer class=\"site-footer\"></footer>\n</body>\n</html>\n",
            escape_text(title),
            content
        )
    }
}

/// Escape text content.
fn escape_text(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value.
fn escape_attribute(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}

/// Render one card per descriptor, in order.
#[must_use]
pub fn render_feature_cards(features: &[FeatureDescriptor]) -> String {
    let mut out = String::from("<div class=\"features-grid\">\n");
    for (index, feature) in features.iter().enumerate() {
        // Writing into a String is infallible.
        let _ = writeln!(
            out,
            "<article class=\"feature-card\" data-card=\"{index}\" {entrance}>\
<div class=\"feature-icon bg-{bg} text-{fg}\" data-icon=\"{icon}\"></div>\
<h3>{title}</h3><p>{description}</p>\
<img src=\"{image}\" alt=\"{alt}\" /></article>",
            entrance = Entrance::for_card(index),
            bg = escape_attribute(feature.background),
            fg = escape_attribute(feature.foreground),
            icon = escape_attribute(feature.icon),
            title = escape_text(feature.title),
            description = escape_text(feature.description),
            image = escape_attribute(feature.image),
            alt = escape_attribute(feature.title),
        );
    }
    out.push_str("</div>\n");
    out
}

/// Render the comparison panels under the verification heading.
#[must_use]
pub fn render_comparison_panels(panels: &[ComparisonPanel]) -> String {
    let mut out = format!(
        "<section class=\"verification\" {}>\n<h2>{}</h2><p>{}</p>\n",
        Entrance::after(0.2),
        escape_text(VERIFICATION_TITLE),
        escape_text(VERIFICATION_INTRO)
    );
    for panel in panels {
        let _ = writeln!(
            out,
            "<div class=\"comparison-panel\"><h3>{}</h3><span class=\"badge\">{}</span><img src=\"{}\" alt=\"{}\" /></div>",
            escape_text(panel.label),
            escape_text(panel.status),
            escape_attribute(panel.image),
            escape_attribute(panel.alt),
        );
    }
    out.push_str("</section>\n");
    out
}

/// Render the complete page inside `shell`.
///
/// # Examples
/// ```
/// use framex::features::{render_features_page, DefaultShell};
///
/// let html = render_features_page(&DefaultShell);
/// assert_eq!(html.matches("class=\"feature-card\"").count(), 6);
/// assert!(html.contains("Linear Static Results"));
/// ```
#[must_use]
pub fn render_features_page(shell: &impl PageShell) -> String {
    let mut content = format!(
        "<header {}><h1>{}</h1><p>{}</p></header>\n",
        Entrance::after(0.0),
        escape_text(PAGE_TITLE),
        escape_text(PAGE_INTRO)
    );
    content.push_str(&render_comparison_panels(&COMPARISON_PANELS));
    content.push_str(&render_feature_cards(&FEATURES));
    shell.frame(PAGE_TITLE, &content)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn cards_follow_descriptor_order() {
        let html = render_feature_cards(&FEATURES);
        let mut last = 0;
        for feature in &FEATURES {
            let heading = format!("<h3>{}</h3>", escape_text(feature.title));
            let position = html.find(&heading).expect("card rendered");
            assert!(position >= last);
            last = position;
        }
        assert_eq!(html.matches("<article").count(), FEATURES.len());
    }

    #[test]
    fn titles_and_descriptions_are_unmodified() {
        let html = render_feature_cards(&FEATURES);
        assert!(html.contains("<h3>The \"Glass Box\" Approach</h3>"));
        assert!(html.contains("verify that ΣF=0 and ΣM=0."));
        assert!(html.contains("alt=\"The &quot;Glass Box&quot; Approach\""));
    }

    #[test]
    fn cards_are_staggered() {
        let html = render_feature_cards(&FEATURES);
        assert!(html.contains("data-card=\"0\" data-initial-opacity=\"0\""));
        assert!(html.contains("data-card=\"5\""));
        assert!(html.contains("data-delay=\"0.5\""));
        assert_relative_eq!(Entrance::for_card(3).delay, 0.3, max_relative = 1.0e-12);
        assert!(Entrance::for_card(3).to_string().contains("data-delay=\"0.3\""));
    }

    #[test]
    fn every_panel_shows_label_and_badge() {
        let html = render_comparison_panels(&COMPARISON_PANELS);
        for panel in &COMPARISON_PANELS {
            assert!(html.contains(&format!("<h3>{}</h3><span class=\"badge\">MATCH</span>", panel.label)));
        }
        assert!(html.contains("data-delay=\"0.2\""));
    }

    #[test]
    fn custom_shell_receives_page_content() {
        struct Bare;
        impl PageShell for Bare {
            fn frame(&self, title: &str, content: &str) -> String {
                format!("[{title}]{content}")
            }
        }
        let html = render_features_page(&Bare);
        assert!(html.starts_with("[Features]<header"));
        assert!(html.contains("Verified Accuracy"));
    }

    #[test]
    fn empty_descriptor_list_renders_empty_grid() {
        assert_eq!(
            render_feature_cards(&[]),
            "<div class=\"features-grid\">\n</div>\n"
        );
    }
}
