use crate::dashboard::{GridSize, WidgetDescriptor};
use rand::Rng;
use std::fmt;

pub const DEFAULT_WIDGET_SIZE: GridSize = GridSize::new(2, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Blue,
    Green,
    Purple,
    Red,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [Self::Blue, Self::Green, Self::Purple, Self::Red];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Purple => "purple",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub message: String,
    pub time: String,
    pub kind: ActivityKind,
}

/// Renderable payload of a widget. Built from the catalogue, or by an
/// assistant edit; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetContent {
    Chart {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Card {
        body: String,
        tip: String,
    },
    Metric {
        value: String,
        label: String,
        change: String,
    },
    Gauge {
        percentage: u8,
        label: String,
    },
    Activity {
        items: Vec<ActivityItem>,
    },
    Panel {
        heading: String,
        body: String,
    },
    Themed {
        scheme: ColorScheme,
        inner: Box<WidgetContent>,
    },
    Placeholder {
        message: String,
    },
}

impl WidgetContent {
    /// Applies `scheme`, replacing any scheme already applied.
    pub fn themed(self, scheme: ColorScheme) -> Self {
        let inner = match self {
            Self::Themed { inner, .. } => inner,
            other => Box::new(other),
        };
        Self::Themed { scheme, inner }
    }

    pub fn scheme(&self) -> Option<ColorScheme> {
        match self {
            Self::Themed { scheme, .. } => Some(*scheme),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WidgetTemplate {
    pub widget_type: &'static str,
    pub title: &'static str,
    /// Words that select this template when the type name itself is absent.
    pub synonyms: &'static [&'static str],
    pub default_size: GridSize,
    pub content: WidgetContent,
}

impl WidgetTemplate {
    /// Catalogue entry as a descriptor, used for suggestion chips.
    pub fn preview(&self) -> WidgetDescriptor {
        WidgetDescriptor {
            id: format!("{}-1", self.widget_type),
            widget_type: self.widget_type.to_string(),
            title: self.title.to_string(),
            content: self.content.clone(),
        }
    }
}

pub struct WidgetRegistry {
    templates: Vec<WidgetTemplate>,
}

impl WidgetRegistry {
    pub fn new(templates: Vec<WidgetTemplate>) -> Self {
        Self { templates }
    }

    pub fn builtin() -> Self {
        Self::new(builtin_templates())
    }

    pub fn templates(&self) -> &[WidgetTemplate] {
        &self.templates
    }

    pub fn types(&self) -> Vec<&'static str> {
        self.templates.iter().map(|t| t.widget_type).collect()
    }

    pub fn lookup(&self, widget_type: &str) -> Option<&WidgetTemplate> {
        self.templates.iter().find(|t| t.widget_type == widget_type)
    }

    pub fn default_size(&self, widget_type: &str) -> GridSize {
        self.lookup(widget_type)
            .map(|t| t.default_size)
            .unwrap_or(DEFAULT_WIDGET_SIZE)
    }

    /// Content for a restored or retyped widget. Unknown types get a
    /// placeholder panel labelled with `title`.
    pub fn recreate_content(&self, widget_type: &str, title: &str) -> WidgetContent {
        match self.lookup(widget_type) {
            Some(template) => template.content.clone(),
            None => WidgetContent::Placeholder {
                message: if title.is_empty() {
                    unknown_title(widget_type)
                } else {
                    title.to_string()
                },
            },
        }
    }

    pub fn instantiate(&self, widget_type: &str, title: Option<&str>) -> WidgetDescriptor {
        self.instantiate_with(widget_type, title, &mut rand::rng())
    }

    /// New descriptor with id `<type>-<0..9999>`. Ids are not checked for
    /// collisions.
    pub fn instantiate_with<R: Rng>(
        &self,
        widget_type: &str,
        title: Option<&str>,
        rng: &mut R,
    ) -> WidgetDescriptor {
        let id = format!("{widget_type}-{}", rng.random_range(0..10_000));
        let title = match (title, self.lookup(widget_type)) {
            (Some(title), _) if !title.is_empty() => title.to_string(),
            (_, Some(template)) => template.title.to_string(),
            (_, None) => unknown_title(widget_type),
        };
        let content = self.recreate_content(widget_type, &title);

        WidgetDescriptor {
            id,
            widget_type: widget_type.to_string(),
            title,
            content,
        }
    }
}

fn unknown_title(widget_type: &str) -> String {
    format!("Unknown Component: {widget_type}")
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

fn builtin_templates() -> Vec<WidgetTemplate> {
    vec![
        WidgetTemplate {
            widget_type: "chart",
            title: "Analytics Chart",
            synonyms: &["chart", "analytics", "graph"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Chart {
                labels: strings(&["Jan", "Feb", "Mar", "Apr"]),
                values: vec![100.0, 150.0, 200.0, 250.0],
            },
        },
        WidgetTemplate {
            widget_type: "table",
            title: "Data Table",
            synonyms: &["table", "data", "grid"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Table {
                headers: strings(&["Name", "Value", "Status"]),
                rows: vec![
                    strings(&["Item 1", "100", "✓ Active"]),
                    strings(&["Item 2", "200", "⚠ Pending"]),
                    strings(&["Item 3", "150", "✓ Active"]),
                ],
            },
        },
        WidgetTemplate {
            widget_type: "card",
            title: "Info Card",
            synonyms: &["card", "info"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Card {
                body: "This is an informational card component that can be moved around the \
                       dashboard. It provides important information at a glance."
                    .to_string(),
                tip: "Drag the title bar to move this component around the dashboard."
                    .to_string(),
            },
        },
        WidgetTemplate {
            widget_type: "metric",
            title: "Key Metric",
            synonyms: &["metric", "key", "kpi"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Metric {
                value: "1,234".to_string(),
                label: "Total Users".to_string(),
                change: "+12% from last month".to_string(),
            },
        },
        WidgetTemplate {
            widget_type: "gauge",
            title: "Performance Gauge",
            synonyms: &["gauge", "performance", "progress"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Gauge {
                percentage: 85,
                label: "System Performance".to_string(),
            },
        },
        WidgetTemplate {
            widget_type: "list",
            title: "Activity List",
            synonyms: &["list", "activity", "log"],
            default_size: DEFAULT_WIDGET_SIZE,
            content: WidgetContent::Activity {
                items: vec![
                    activity("User login successful", "2m ago", ActivityKind::Success),
                    activity("Data export completed", "5m ago", ActivityKind::Info),
                    activity("New component added", "8m ago", ActivityKind::Success),
                    activity("System backup started", "12m ago", ActivityKind::Info),
                ],
            },
        },
    ]
}

fn activity(message: &str, time: &str, kind: ActivityKind) -> ActivityItem {
    ActivityItem {
        message: message.to_string(),
        time: time.to_string(),
        kind,
    }
}
