use crate::chat::ChatOwner;

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The simulated thinking delay for `input` has elapsed.
    AssistantTurnDue { owner: ChatOwner, input: String },
}
