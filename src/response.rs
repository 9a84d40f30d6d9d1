//! Wire rendering of a resolution

use crate::release::RenderContext;
use crate::resolve::{Artifact, Resolution};

/// Response for "no update", byte-for-byte what clients expect
pub const EMPTY_RESPONSE: &str = "<?xml version=\"1.0\"?>\n<updates>\n</updates>";

const AMP_ENTITY: &str = "&amp;";

/// Render a resolution as the update XML document
///
/// The primary release provides the document header and footer. Inner
/// fragments come from the secondaries, or from the primary itself when
/// nothing was bundled.
pub fn render(
    resolution: &Resolution,
    whitelisted_domains: &[String],
    special_force_hosts: &[String],
) -> String {
    let Some(primary) = &resolution.primary else {
        return EMPTY_RESPONSE.to_string();
    };

    let ctx = RenderContext {
        whitelisted_domains,
        special_force_hosts,
    };

    let artifacts: &[Artifact] = if resolution.secondaries.is_empty() {
        std::slice::from_ref(primary)
    } else {
        &resolution.secondaries
    };

    let release = primary.blob.as_ref();
    let mut lines = release.render_header();
    lines.extend(release.render_inner_header(&primary.query, &ctx));
    for artifact in artifacts {
        lines.extend(artifact.blob.render_inner(&artifact.query, &ctx));
    }
    lines.extend(release.render_inner_footer(&primary.query, &ctx));
    lines.extend(release.render_footer());

    escape_ampersands(&lines.join("\n"))
}

/// Replace every `&` that does not already start `&amp;`
pub fn escape_ampersands(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut last = 0;
    for (idx, _) in text.match_indices('&') {
        escaped.push_str(&text[last..idx]);
        if text[idx..].starts_with(AMP_ENTITY) {
            escaped.push('&');
        } else {
            escaped.push_str(AMP_ENTITY);
        }
        last = idx + 1;
    }
    escaped.push_str(&text[last..]);
    escaped
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::query::UpdateQuery;
    use crate::release::Release;
    use rstest::rstest;

    #[derive(Debug)]
    struct Fragment {
        name: &'static str,
        inner: &'static str,
    }

    impl Release for Fragment {
        fn name(&self) -> &str {
            self.name
        }

        fn should_serve_update(&self, _query: &UpdateQuery) -> bool {
            true
        }

        fn render_header(&self) -> Vec<String> {
            vec!["<?xml version=\"1.0\"?>".to_string(), "<updates>".to_string()]
        }

        fn render_inner_header(&self, _query: &UpdateQuery, _ctx: &RenderContext<'_>) -> Vec<String> {
            vec![format!("<!-- {} -->", self.name)]
        }

        fn render_inner(&self, query: &UpdateQuery, ctx: &RenderContext<'_>) -> Vec<String> {
            vec![format!(
                "<update product=\"{}\" {} domains=\"{}\"/>",
                query.product,
                self.inner,
                ctx.whitelisted_domains.join(",")
            )]
        }

        fn render_footer(&self) -> Vec<String> {
            vec!["</updates>".to_string()]
        }
    }

    fn artifact(name: &'static str, inner: &'static str, product: &str) -> Artifact {
        Artifact {
            blob: Arc::new(Fragment { name, inner }),
            query: UpdateQuery {
                product: product.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn no_update_renders_empty_envelope() {
        let rendered = render(&Resolution::no_update(), &[], &[]);
        assert_eq!(rendered, "<?xml version=\"1.0\"?>\n<updates>\n</updates>");
    }

    #[test]
    fn primary_alone_renders_its_own_inner_fragment() {
        let resolution = Resolution {
            primary: Some(artifact("main", "x=\"1\"", "P")),
            secondaries: vec![],
        };
        let domains = vec!["download.example.com".to_string()];

        let rendered = render(&resolution, &domains, &[]);

        assert_eq!(
            rendered,
            [
                "<?xml version=\"1.0\"?>",
                "<updates>",
                "<!-- main -->",
                "<update product=\"P\" x=\"1\" domains=\"download.example.com\"/>",
                "</updates>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn secondaries_replace_primary_inner_fragment() {
        let resolution = Resolution {
            primary: Some(artifact("superblob", "x=\"0\"", "P")),
            secondaries: vec![artifact("b", "x=\"b\"", "B"), artifact("c", "x=\"c\"", "C")],
        };

        let rendered = render(&resolution, &[], &[]);

        assert_eq!(
            rendered,
            [
                "<?xml version=\"1.0\"?>",
                "<updates>",
                "<!-- superblob -->",
                "<update product=\"B\" x=\"b\" domains=\"\"/>",
                "<update product=\"C\" x=\"c\" domains=\"\"/>",
                "</updates>",
            ]
            .join("\n")
        );
    }

    #[test]
    fn render_escapes_raw_ampersands_only() {
        let resolution = Resolution {
            primary: Some(artifact("main", "URL=\"a?x=1&y=2&amp;z=3\"", "P")),
            secondaries: vec![],
        };

        let rendered = render(&resolution, &[], &[]);

        assert!(rendered.contains("URL=\"a?x=1&amp;y=2&amp;z=3\""));
    }

    #[rstest]
    #[case("a&b", "a&amp;b")]
    #[case("a&amp;b", "a&amp;b")]
    #[case("&&amp;&", "&amp;&amp;&amp;")]
    #[case("&am", "&amp;am")]
    #[case("no entities", "no entities")]
    #[case("&", "&amp;")]
    fn escape_ampersands_returns_expected(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(escape_ampersands(input), expected);
    }
}
