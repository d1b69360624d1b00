//! Short summaries and spoken descriptions of analyzed changes.

use super::ChangeKind;
use super::patterns::{Declaration, QualityMarker, match_declaration, match_quality};

/// Salient markers found in the added lines of a diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedFeatures {
    pub test_classes: usize,
    pub test_functions: usize,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    /// Declared names, deduplicated, first appearance order.
    pub names: Vec<String>,
    /// Quality markers in first appearance order.
    pub quality: Vec<QualityMarker>,
}

impl AddedFeatures {
    pub fn scan<'a>(added_lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut features = Self::default();
        for line in added_lines {
            if let Some(decl) = match_declaration(line) {
                match decl.kind {
                    Declaration::TestClass => features.test_classes += 1,
                    Declaration::TestFunction => features.test_functions += 1,
                    Declaration::Class => push_unique(&mut features.classes, decl.name.as_deref()),
                    Declaration::Function => {
                        push_unique(&mut features.functions, decl.name.as_deref())
                    }
                }
                push_unique(&mut features.names, decl.name.as_deref());
            }
            for marker in match_quality(line) {
                if !features.quality.contains(&marker) {
                    features.quality.push(marker);
                }
            }
        }
        features
    }

    pub fn has_tests(&self) -> bool {
        self.test_classes > 0 || self.test_functions > 0
    }
}

fn push_unique(list: &mut Vec<String>, name: Option<&str>) {
    if let Some(name) = name
        && !list.iter().any(|n| n == name)
    {
        list.push(name.to_string());
    }
}

fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

fn quality_suffix(features: &AddedFeatures) -> String {
    if features.quality.is_empty() {
        return String::new();
    }
    let labels: Vec<&str> = features.quality.iter().map(QualityMarker::label).collect();
    format!(" (with {})", labels.join(", "))
}

/// One-line summary, most specific pattern first.
pub(super) fn summarize(added: usize, removed: usize, features: &AddedFeatures) -> String {
    if added == 0 && removed == 0 {
        return "No changes".to_string();
    }

    let head = if features.has_tests() {
        format!(
            "Added test suite with {}",
            plural(features.test_functions, "test method", "test methods")
        )
    } else if !features.functions.is_empty() {
        let noun = if features.functions.len() == 1 { "function" } else { "functions" };
        format!("Added {}: {}", noun, features.functions.join(", "))
    } else if !features.classes.is_empty() {
        let noun = if features.classes.len() == 1 { "class" } else { "classes" };
        format!("Added {}: {}", noun, features.classes.join(", "))
    } else if added > 0 && removed > 0 {
        format!("Modified code: +{}/-{} lines", added, removed)
    } else if added > 0 {
        format!("Added {}", plural(added, "line", "lines"))
    } else {
        format!("Removed {}", plural(removed, "line", "lines"))
    };

    format!("{}{}", head, quality_suffix(features))
}

/// Longer narration of a change, structured by its kind.
pub(super) fn describe(
    kind: ChangeKind,
    added: usize,
    removed: usize,
    features: &AddedFeatures,
) -> String {
    if added == 0 && removed == 0 {
        return "No changes were made.".to_string();
    }

    let mut parts = Vec::new();
    parts.push(match kind {
        ChangeKind::TestAddition => format!(
            "Added a test suite with {} and {}.",
            plural(features.test_classes, "test class", "test classes"),
            plural(features.test_functions, "test method", "test methods")
        ),
        ChangeKind::FullRewrite => format!(
            "Rewrote the code: {} added and {} removed.",
            plural(added, "line", "lines"),
            plural(removed, "line", "lines")
        ),
        ChangeKind::PartialModification => format!(
            "Modified part of the code: {} added and {} removed.",
            plural(added, "line", "lines"),
            plural(removed, "line", "lines")
        ),
        ChangeKind::Addition if added == 0 => {
            format!("Removed {}.", plural(removed, "line", "lines"))
        }
        ChangeKind::Addition => format!("Added {}.", plural(added, "line", "lines")),
    });

    let mut counts = Vec::new();
    if !features.functions.is_empty() {
        counts.push(format!(
            "{} ({})",
            plural(features.functions.len(), "new function", "new functions"),
            features.functions.join(", ")
        ));
    }
    if !features.classes.is_empty() {
        counts.push(format!(
            "{} ({})",
            plural(features.classes.len(), "new class", "new classes"),
            features.classes.join(", ")
        ));
    }
    if kind != ChangeKind::TestAddition && features.has_tests() {
        counts.push(plural(features.test_functions, "test method", "test methods"));
    }
    if !counts.is_empty() {
        parts.push(format!("Includes {}.", counts.join(" and ")));
    }

    if !features.quality.is_empty() {
        let labels: Vec<&str> = features.quality.iter().map(QualityMarker::label).collect();
        parts.push(format!("Improves {}.", labels.join(" and ")));
    }

    parts.join(" ")
}
