//! Visualization artifact selection.

use voltra_sandbox::{VisualizationArtifact, VisualizationFormat};

/// Selects one visualization from the artifacts an execution produced.
///
/// Priority: exact match to the caller-preferred format, else HTML
/// (interactive), else SVG, else PNG, else the first artifact.
pub fn select_visualization(
    artifacts: Vec<VisualizationArtifact>,
    preferred: Option<VisualizationFormat>,
) -> Option<VisualizationArtifact> {
    if artifacts.is_empty() {
        return None;
    }

    if let Some(preferred) = preferred
        && let Some(artifact) = artifacts.iter().find(|a| a.format == preferred)
    {
        return Some(artifact.clone());
    }

    const PRIORITY: &[VisualizationFormat] = &[
        VisualizationFormat::Html,
        VisualizationFormat::Svg,
        VisualizationFormat::Png,
    ];

    for format in PRIORITY {
        if let Some(artifact) = artifacts.iter().find(|a| a.format == *format) {
            return Some(artifact.clone());
        }
    }

    artifacts.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, format: VisualizationFormat) -> VisualizationArtifact {
        VisualizationArtifact {
            name: name.into(),
            format,
            mime_type: format.mime_type().into(),
            data: "payload".into(),
        }
    }

    #[test]
    fn test_preferred_format_wins() {
        let selected = select_visualization(
            vec![
                artifact("a.html", VisualizationFormat::Html),
                artifact("b.png", VisualizationFormat::Png),
            ],
            Some(VisualizationFormat::Png),
        );

        assert_eq!(selected.unwrap().name, "b.png");
    }

    #[test]
    fn test_html_beats_svg_and_png() {
        let selected = select_visualization(
            vec![
                artifact("b.png", VisualizationFormat::Png),
                artifact("c.svg", VisualizationFormat::Svg),
                artifact("a.html", VisualizationFormat::Html),
            ],
            None,
        );

        assert_eq!(selected.unwrap().name, "a.html");
    }

    #[test]
    fn test_svg_beats_png() {
        let selected = select_visualization(
            vec![
                artifact("b.png", VisualizationFormat::Png),
                artifact("c.svg", VisualizationFormat::Svg),
            ],
            None,
        );

        assert_eq!(selected.unwrap().name, "c.svg");
    }

    #[test]
    fn test_first_artifact_as_last_resort() {
        let selected = select_visualization(
            vec![
                artifact("data.json", VisualizationFormat::Json),
                artifact("other.json", VisualizationFormat::Json),
            ],
            None,
        );

        assert_eq!(selected.unwrap().name, "data.json");
    }

    #[test]
    fn test_empty_artifacts() {
        assert!(select_visualization(vec![], None).is_none());
    }

    #[test]
    fn test_missing_preferred_falls_back_to_priority() {
        let selected = select_visualization(
            vec![artifact("b.png", VisualizationFormat::Png)],
            Some(VisualizationFormat::Html),
        );

        assert_eq!(selected.unwrap().name, "b.png");
    }
}
