use crate::dashboard::GridSize;
use crate::widgets::catalog::{ColorScheme, WidgetRegistry};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static TITLE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[r"(?i)change title to (.+)", r"(?i)update title to (.+)"])
});

static CONTENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)change content to (.+)",
        r"(?i)update content to (.+)",
        r"(?i)modify content to (.+)",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeChange {
    Bigger,
    Smaller,
}

impl SizeChange {
    /// Absolute target, independent of the widget's current size.
    pub fn target(&self) -> GridSize {
        match self {
            Self::Bigger => GridSize::new(6, 4),
            Self::Smaller => GridSize::new(2, 2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bigger => "bigger",
            Self::Smaller => "smaller",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Add { widget_type: String },
    ListAvailable,
    ShowOptions,
    Restyle { scheme: ColorScheme },
    Resize { change: SizeChange },
    Rename { title: String },
    Recontent { content: String },
    Help,
    Echo { input: String },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::ListAvailable => "list",
            Self::ShowOptions => "options",
            Self::Restyle { .. } => "restyle",
            Self::Resize { .. } => "resize",
            Self::Rename { .. } => "rename",
            Self::Recontent { .. } => "recontent",
            Self::Help => "help",
            Self::Echo { .. } => "echo",
        }
    }
}

/// Classifies one chat input. First matching rule wins; matching is plain
/// substring containment on the lower-cased text.
pub fn intent_from_text(text: &str, registry: &WidgetRegistry) -> Intent {
    let lowered = text.to_lowercase();
    let has_any = |terms: &[&str]| terms.iter().any(|term| lowered.contains(term));

    if has_any(&["add", "show", "need"]) {
        if let Some(widget_type) = requested_widget_type(&lowered, registry) {
            return Intent::Add { widget_type };
        }
        if has_any(&["component", "what", "available"]) {
            return Intent::ListAvailable;
        }
        return Intent::ShowOptions;
    }

    if has_any(&["change color", "make it"]) {
        if let Some(scheme) = ColorScheme::ALL
            .into_iter()
            .find(|scheme| lowered.contains(scheme.as_str()))
        {
            return Intent::Restyle { scheme };
        }
    }

    if has_any(&["bigger", "larger", "increase size"]) {
        return Intent::Resize {
            change: SizeChange::Bigger,
        };
    }
    if has_any(&["smaller", "decrease size"]) {
        return Intent::Resize {
            change: SizeChange::Smaller,
        };
    }

    if let Some(title) = capture_argument(text, &TITLE_PATTERNS) {
        return Intent::Rename { title };
    }
    if let Some(content) = capture_argument(text, &CONTENT_PATTERNS) {
        return Intent::Recontent { content };
    }

    if has_any(&["help", "what can you do"]) {
        return Intent::Help;
    }

    debug!(input = text, "no rule matched chat input");
    Intent::Echo {
        input: text.to_string(),
    }
}

/// Catalogue types and titles are tried before synonyms, each in catalogue order.
fn requested_widget_type(lowered: &str, registry: &WidgetRegistry) -> Option<String> {
    let templates = registry.templates();
    templates
        .iter()
        .find(|t| lowered.contains(t.widget_type) || lowered.contains(&t.title.to_lowercase()))
        .or_else(|| {
            templates
                .iter()
                .find(|t| t.synonyms.iter().any(|synonym| lowered.contains(synonym)))
        })
        .map(|t| t.widget_type.to_string())
}

/// Text captured by the first matching pattern, trimmed. Case of the
/// original input is kept.
pub fn capture_argument(text: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        let captured = pattern.captures(text)?.get(1)?.as_str().trim();
        (!captured.is_empty()).then(|| captured.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::{intent_from_text, Intent, SizeChange};
    use crate::dashboard::GridSize;
    use crate::widgets::catalog::{ColorScheme, WidgetRegistry};

    fn dispatch(text: &str) -> Intent {
        intent_from_text(text, &WidgetRegistry::builtin())
    }

    fn add(widget_type: &str) -> Intent {
        Intent::Add {
            widget_type: widget_type.to_string(),
        }
    }

    #[test]
    fn explicit_types_are_added() {
        assert_eq!(dispatch("add chart"), add("chart"));
        assert_eq!(dispatch("Show me a TABLE"), add("table"));
        assert_eq!(dispatch("I need a data table"), add("table"));
        assert_eq!(dispatch("add the performance gauge"), add("gauge"));
    }

    #[test]
    fn synonyms_map_to_catalogue_types() {
        assert_eq!(dispatch("add a graph"), add("chart"));
        assert_eq!(dispatch("need a grid"), add("table"));
        assert_eq!(dispatch("add kpi"), add("metric"));
        assert_eq!(dispatch("show progress"), add("gauge"));
        assert_eq!(dispatch("add the log"), add("list"));
    }

    #[test]
    fn explicit_type_beats_an_earlier_synonym() {
        // "data" is a table synonym, but "list" is an explicit type name.
        assert_eq!(dispatch("add data list"), add("list"));
    }

    #[test]
    fn listing_and_generic_options() {
        assert_eq!(dispatch("show components"), Intent::ListAvailable);
        assert_eq!(dispatch("what is available to add?"), Intent::ListAvailable);
        assert_eq!(dispatch("add something nice"), Intent::ShowOptions);
    }

    #[test]
    fn restyle_requires_a_known_color() {
        assert_eq!(
            dispatch("change color to purple"),
            Intent::Restyle {
                scheme: ColorScheme::Purple
            }
        );
        assert_eq!(
            dispatch("Make it GREEN"),
            Intent::Restyle {
                scheme: ColorScheme::Green
            }
        );
        assert!(matches!(
            dispatch("change color to teal"),
            Intent::Echo { .. }
        ));
    }

    #[test]
    fn resize_targets_are_fixed() {
        let bigger = dispatch("make it bigger");
        assert_eq!(
            bigger,
            Intent::Resize {
                change: SizeChange::Bigger
            }
        );
        assert_eq!(SizeChange::Bigger.target(), GridSize::new(6, 4));
        assert_eq!(
            dispatch("please decrease size"),
            Intent::Resize {
                change: SizeChange::Smaller
            }
        );
        assert_eq!(SizeChange::Smaller.target(), GridSize::new(2, 2));
    }

    #[test]
    fn rename_and_recontent_keep_the_original_case() {
        assert_eq!(
            dispatch("Change Title to Quarterly Revenue "),
            Intent::Rename {
                title: "Quarterly Revenue".to_string()
            }
        );
        assert_eq!(
            dispatch("modify content to Deploys are green"),
            Intent::Recontent {
                content: "Deploys are green".to_string()
            }
        );
    }

    #[test]
    fn rename_without_argument_falls_through() {
        assert!(matches!(dispatch("change title to   "), Intent::Echo { .. }));
        assert_eq!(dispatch("change title please help"), Intent::Help);
    }

    #[test]
    fn help_and_echo() {
        assert_eq!(dispatch("what can you do"), Intent::Help);
        assert_eq!(
            dispatch("hello there"),
            Intent::Echo {
                input: "hello there".to_string()
            }
        );
    }

    #[test]
    fn add_keywords_take_priority_over_edits() {
        // "show" opens the add branch even though a title change is requested.
        assert_eq!(dispatch("update title to Showcase"), Intent::ShowOptions);
    }

    #[test]
    fn dispatch_is_deterministic() {
        let registry = WidgetRegistry::builtin();
        for input in ["add chart", "make it red", "help", "zzz", "show components"] {
            assert_eq!(
                intent_from_text(input, &registry),
                intent_from_text(input, &registry)
            );
        }
    }
}
