//! Refresh boundary between a session and whatever displays it.

use crate::context::DialogueContext;

/// What a widget should do on refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetCommand {
    CreateDialogueWidget,
    CloseDialogueWidget,
    ShowDialogueRow,
    UpdateDialogueRow,
    HideDialogueRow,
    AddDialogueOptions,
    RemoveDialogueOptions,
}

impl WidgetCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetCommand::CreateDialogueWidget => "CreateDialogueWidget",
            WidgetCommand::CloseDialogueWidget => "CloseDialogueWidget",
            WidgetCommand::ShowDialogueRow => "ShowDialogueRow",
            WidgetCommand::UpdateDialogueRow => "UpdateDialogueRow",
            WidgetCommand::HideDialogueRow => "HideDialogueRow",
            WidgetCommand::AddDialogueOptions => "AddDialogueOptions",
            WidgetCommand::RemoveDialogueOptions => "RemoveDialogueOptions",
        }
    }
}

impl std::fmt::Display for WidgetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that presents a dialogue.
///
/// Called by the session after every context change. Implementations read
/// what they need from `context`.
pub trait DialogueWidget {
    fn refresh_dialogue_widget(&mut self, context: &DialogueContext, command: WidgetCommand);
}

impl<F> DialogueWidget for F
where
    F: FnMut(&DialogueContext, WidgetCommand),
{
    fn refresh_dialogue_widget(&mut self, context: &DialogueContext, command: WidgetCommand) {
        self(context, command)
    }
}
