use crate::chat::intent::{intent_from_text, Intent, SizeChange};
use crate::chat::{ChatMessage, ChatOwner, Sender, Suggestion};
use crate::dashboard::store::{LayoutChange, LayoutStore};
use crate::dashboard::{DescriptorPatch, GridSize, WidgetDescriptor};
use crate::widgets::catalog::{ColorScheme, WidgetContent, WidgetRegistry};
use rand::Rng;

/// Mutation requested by an assistant reply.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetAction {
    Add(WidgetDescriptor),
    Restyle(ColorScheme),
    Resize(GridSize),
    Rename(String),
    Recontent(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssistantReply {
    pub intent: Intent,
    pub text: String,
    pub attached_widget: Option<WidgetDescriptor>,
    pub suggestions: Vec<Suggestion>,
    pub action: Option<WidgetAction>,
}

impl AssistantReply {
    fn text(intent: Intent, text: impl Into<String>, suggestions: Vec<Suggestion>) -> Self {
        Self {
            intent,
            text: text.into(),
            attached_widget: None,
            suggestions,
            action: None,
        }
    }

    fn with_action(mut self, action: WidgetAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn into_message(self, id: impl Into<String>) -> ChatMessage {
        let mut message = ChatMessage::new(id, Sender::Assistant, self.text);
        message.attached_widget = self.attached_widget;
        message.suggestions = self.suggestions;
        message
    }
}

pub fn respond(
    input: &str,
    registry: &WidgetRegistry,
    target: Option<&WidgetDescriptor>,
) -> AssistantReply {
    resolve(
        intent_from_text(input, registry),
        registry,
        target,
        &mut rand::rng(),
    )
}

/// Builds the reply for `intent`. Edits need a `target` widget; the
/// dashboard-wide assistant has none.
pub fn resolve<R: Rng>(
    intent: Intent,
    registry: &WidgetRegistry,
    target: Option<&WidgetDescriptor>,
    rng: &mut R,
) -> AssistantReply {
    let types = registry.types().join(", ");
    let catalogue = || -> Vec<Suggestion> {
        registry
            .templates()
            .iter()
            .map(|t| Suggestion::Widget(t.preview()))
            .collect()
    };

    let edits_target = matches!(
        intent,
        Intent::Restyle { .. }
            | Intent::Resize { .. }
            | Intent::Rename { .. }
            | Intent::Recontent { .. }
    );
    if edits_target && target.is_none() {
        return AssistantReply::text(
            intent,
            "Open the chat on a component to change its color, size, title or content.",
            texts(&["add chart", "show components", "help"]),
        );
    }

    match intent {
        Intent::Add { ref widget_type } => {
            if registry.lookup(widget_type).is_none() {
                let text = format!(
                    "Sorry, I couldn't find a component of type \"{widget_type}\". Available types: {types}"
                );
                return AssistantReply::text(intent, text, Vec::new());
            }
            let widget = registry.instantiate_with(widget_type, None, rng);
            let text = format!("I've added the {} to your dashboard!", widget.title);
            AssistantReply {
                intent,
                text,
                attached_widget: Some(widget.clone()),
                suggestions: Vec::new(),
                action: Some(WidgetAction::Add(widget)),
            }
        }
        Intent::ListAvailable => AssistantReply::text(
            intent,
            format!(
                "Here are the available components you can add to your dashboard: {types}. \
                 Try saying \"add [component type]\" or \"need [component type]\"."
            ),
            catalogue(),
        ),
        Intent::ShowOptions => AssistantReply::text(
            intent,
            format!(
                "I can help you add components to your dashboard. Available types: {types}. \
                 Try saying \"add [component type]\" or \"show components\"."
            ),
            catalogue(),
        ),
        Intent::Restyle { scheme } => {
            let others: Vec<Suggestion> = ColorScheme::ALL
                .into_iter()
                .filter(|other| *other != scheme)
                .take(2)
                .map(|other| Suggestion::text(format!("change color to {other}")))
                .chain(std::iter::once(Suggestion::text("make it bigger")))
                .collect();
            let text = format!(
                "I've updated the component with a {scheme} color scheme! \
                 The component now has a {scheme} background and border."
            );
            AssistantReply::text(intent, text, others).with_action(WidgetAction::Restyle(scheme))
        }
        Intent::Resize { change } => {
            let size = change.target();
            let text = format!(
                "I've made the component {}! It's now {}x{} grid units.",
                change.as_str(),
                size.w,
                size.h
            );
            let undo = match change {
                SizeChange::Bigger => "make it smaller",
                SizeChange::Smaller => "make it bigger",
            };
            AssistantReply::text(
                intent,
                text,
                texts(&[undo, "change color to blue", "change title"]),
            )
            .with_action(WidgetAction::Resize(size))
        }
        Intent::Rename { ref title } => {
            let text = format!("I've updated the title to \"{title}\"!");
            let action = WidgetAction::Rename(title.clone());
            AssistantReply::text(
                intent,
                text,
                texts(&["change color to blue", "make it bigger", "change content"]),
            )
            .with_action(action)
        }
        Intent::Recontent { ref content } => {
            let text = format!("I've updated the content to: \"{content}\"");
            let action = WidgetAction::Recontent(content.clone());
            AssistantReply::text(
                intent,
                text,
                texts(&["change color to blue", "make it bigger", "change title"]),
            )
            .with_action(action)
        }
        Intent::Help => AssistantReply::text(
            intent,
            format!(
                "I can help you manage your dashboard! Here's what I can do:\n\
                 • Add components: \"add [component type]\" ({types})\n\
                 • List components: \"show components\"\n\
                 • Change colors: \"change color to blue/green/purple/red\"\n\
                 • Change size: \"make it bigger/smaller\"\n\
                 • Change title: \"change title to [new title]\"\n\
                 • Change content: \"change content to [new content]\"\n\
                 • Get help: \"help\" or \"what can you do\""
            ),
            texts(&["change color to blue", "make it bigger", "change title", "help"]),
        ),
        Intent::Echo { ref input } => {
            let text = format!(
                "I received your message: \"{input}\". Available components: {types}. \
                 You can also ask me to \"change color to blue/green/purple/red\", \
                 \"make it bigger/smaller\", \"change title to [new title]\", or \
                 \"change content to [new content]\"."
            );
            AssistantReply::text(
                intent,
                text,
                texts(&["change color to blue", "make it bigger", "change title", "help"]),
            )
        }
    }
}

/// Greeting appended when a chat window is opened for the first time.
pub fn welcome_text(target: Option<&WidgetDescriptor>) -> String {
    match target {
        Some(widget) => format!(
            "Hello! I'm here to help you modify the \"{}\" component. You can ask me to change \
             colors, content, size, or other properties. Try saying \"change color to blue\" or \
             \"make it bigger\".",
            widget.title
        ),
        None => "Hello! I'm your AI assistant. I can help you add components to your dashboard. \
                 Try saying 'add chart', 'show components', or 'I need a data table'."
            .to_string(),
    }
}

pub fn welcome_message(id: impl Into<String>, target: Option<&WidgetDescriptor>) -> ChatMessage {
    let mut message = ChatMessage::new(id, Sender::Assistant, welcome_text(target));
    message.suggestions = match target {
        Some(_) => texts(&["change color to blue", "make it bigger"]),
        None => texts(&["add chart", "show components", "I need a data table"]),
    };
    message
}

/// Applies `action` on behalf of the chat owned by `owner`.
///
/// An add from a widget's own chat turns that widget into the new type in
/// place; from the dashboard assistant it places a new widget.
pub fn apply_action(
    store: &mut LayoutStore,
    registry: &WidgetRegistry,
    owner: &ChatOwner,
    action: WidgetAction,
) -> LayoutChange {
    let target_id = owner
        .widget_id()
        .filter(|id| store.contains(id))
        .map(str::to_string);

    match (action, target_id) {
        (WidgetAction::Add(widget), Some(id)) => store.update_descriptor(
            &id,
            DescriptorPatch {
                widget_type: Some(widget.widget_type),
                title: Some(widget.title),
                content: Some(widget.content),
            },
        ),
        (WidgetAction::Add(widget), None) => store.add(widget, None, registry),
        (_, None) => LayoutChange::Unchanged,
        (WidgetAction::Restyle(scheme), Some(id)) => {
            let Some(current) = store.widget(&id) else {
                return LayoutChange::Unchanged;
            };
            let content = current.content.clone().themed(scheme);
            store.update_descriptor(
                &id,
                DescriptorPatch {
                    content: Some(content),
                    ..DescriptorPatch::default()
                },
            )
        }
        (WidgetAction::Resize(size), Some(id)) => store.resize_in_grid(&id, size),
        (WidgetAction::Rename(title), Some(id)) => store.update_descriptor(
            &id,
            DescriptorPatch {
                content: Some(WidgetContent::Panel {
                    heading: title.clone(),
                    body: "Title updated successfully!".to_string(),
                }),
                title: Some(title),
                ..DescriptorPatch::default()
            },
        ),
        (WidgetAction::Recontent(body), Some(id)) => {
            let Some(current) = store.widget(&id) else {
                return LayoutChange::Unchanged;
            };
            let content = WidgetContent::Panel {
                heading: current.title.clone(),
                body,
            };
            store.update_descriptor(
                &id,
                DescriptorPatch {
                    content: Some(content),
                    ..DescriptorPatch::default()
                },
            )
        }
    }
}

fn texts(items: &[&str]) -> Vec<Suggestion> {
    items.iter().map(|item| Suggestion::text(*item)).collect()
}
