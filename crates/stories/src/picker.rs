use serde::Deserialize;

use crate::years::{YearIndex, YearToken};

/// Which of the two year pickers is shown.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickerVariant {
    /// Plain `<select>` control.
    Native,
    /// Toggle button with a collapsible list.
    #[default]
    Popover,
}

impl PickerVariant {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" | "select" => Some(PickerVariant::Native),
            "popover" | "custom" | "dropdown" => Some(PickerVariant::Popover),
            _ => None,
        }
    }
}

/// Everything a picker needs to draw itself.
#[derive(Debug, Clone, Copy)]
pub struct PickerView<'a> {
    pub index: &'a YearIndex,
    pub selected: &'a YearToken,
    pub all_label: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PickerEntry<'a> {
    pub token: &'a YearToken,
    pub label: &'a str,
    pub selected: bool,
}

impl<'a> PickerView<'a> {
    /// Text for the popover's toggle button.
    pub fn toggle_label(&self) -> &'a str {
        self.selected.label(self.all_label)
    }

    /// One entry per token, `All` first.
    pub fn entries(&self) -> impl Iterator<Item = PickerEntry<'a>> + 'a {
        let selected = self.selected;
        let all_label = self.all_label;
        self.index.tokens().iter().map(move |token| PickerEntry {
            token,
            label: token.label(all_label),
            selected: token == selected,
        })
    }

    /// Options the native control appends after its fixed "all" option.
    pub fn native_options(&self) -> impl Iterator<Item = PickerEntry<'a>> + 'a {
        self.entries().filter(|e| !e.token.is_all())
    }
}

/// A year picker widget. Both variants are rendered after every selection
/// change, whether visible or not; user choices flow back through
/// [`crate::SelectionController::select`].
pub trait YearPicker {
    fn variant(&self) -> PickerVariant;

    fn render(&mut self, view: &PickerView<'_>);

    fn set_hidden(&mut self, hidden: bool);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PopoverEvent {
    Toggle,
    /// A click landed outside the picker's root element.
    OutsideClick,
    Escape,
    Selected,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PopoverTransition {
    /// The list must be re-rendered against current state, then shown.
    Opened,
    Closed,
    Unchanged,
}

/// Open/closed state of the popover list.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct PopoverState {
    open: bool,
}

impl PopoverState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn handle(&mut self, event: PopoverEvent) -> PopoverTransition {
        let next = match event {
            PopoverEvent::Toggle => !self.open,
            PopoverEvent::OutsideClick | PopoverEvent::Escape | PopoverEvent::Selected => false,
        };
        let transition = match (self.open, next) {
            (false, true) => PopoverTransition::Opened,
            (true, false) => PopoverTransition::Closed,
            _ => PopoverTransition::Unchanged,
        };
        self.open = next;
        transition
    }
}
