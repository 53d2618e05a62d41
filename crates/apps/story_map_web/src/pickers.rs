//! DOM renderings of the two year pickers.

use std::cell::RefCell;
use std::rc::Rc;

use stories::{
    PickerConfig, PickerEntry, PickerVariant, PickerView, PopoverEvent, PopoverState,
    PopoverTransition, SelectionController, YearPicker, YearToken,
};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, Event, HtmlElement, HtmlOptionElement, HtmlSelectElement, KeyboardEvent,
    Node,
};

use crate::dom::{element_by_id, listen};
use crate::error::{AppError, js_message};

/// Attribute carrying the year token on popover list entries.
pub const YEAR_ATTR: &str = "data-year";
const SELECTED_CLASS: &str = "is-selected";
const OPEN_CLASS: &str = "is-open";

/// A `<select>` with a fixed "all" option followed by one option per year.
#[derive(Debug, Clone)]
pub struct NativePicker {
    root: HtmlElement,
    select: HtmlSelectElement,
}

impl NativePicker {
    pub fn find(document: &Document, config: &PickerConfig) -> Result<Self, AppError> {
        let select: HtmlSelectElement = element_by_id(document, &config.native_select_id)?;
        let root = element_by_id::<HtmlElement>(document, &config.native_root_id)
            .unwrap_or_else(|_| select.clone().into());
        Ok(Self { root, select })
    }

    pub fn select(&self) -> &HtmlSelectElement {
        &self.select
    }

    fn append_option(&self, value: &str, label: &str) -> Result<(), JsValue> {
        let option = HtmlOptionElement::new_with_text_and_value(label, value)?;
        self.select.append_child(&option)?;
        Ok(())
    }
}

impl YearPicker for NativePicker {
    fn variant(&self) -> PickerVariant {
        PickerVariant::Native
    }

    fn render(&mut self, view: &PickerView<'_>) {
        self.select.set_inner_html("");
        let options = std::iter::once((YearToken::ALL, view.all_label))
            .chain(view.native_options().map(|e| (e.token.as_str(), e.label)));
        for (value, label) in options {
            if let Err(err) = self.append_option(value, label) {
                tracing::warn!(value, error = %js_message(&err), "could not add year option");
            }
        }
        self.select.set_value(view.selected.as_str());
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.root.set_hidden(hidden);
    }
}

/// A toggle button showing the active year over a list of year buttons.
#[derive(Debug, Clone)]
pub struct PopoverPicker {
    document: Document,
    root: HtmlElement,
    toggle: HtmlElement,
    list: HtmlElement,
}

impl PopoverPicker {
    pub fn find(document: &Document, config: &PickerConfig) -> Result<Self, AppError> {
        let picker = Self {
            document: document.clone(),
            root: element_by_id(document, &config.popover_root_id)?,
            toggle: element_by_id(document, &config.popover_toggle_id)?,
            list: element_by_id(document, &config.popover_list_id)?,
        };
        picker.set_open(false);
        Ok(picker)
    }

    pub fn toggle(&self) -> &HtmlElement {
        &self.toggle
    }

    pub fn list(&self) -> &HtmlElement {
        &self.list
    }

    pub fn set_open(&self, open: bool) {
        self.list.set_hidden(!open);
        if let Err(err) = self
            .toggle
            .set_attribute("aria-expanded", if open { "true" } else { "false" })
        {
            tracing::warn!(open, error = %js_message(&err), "could not set aria-expanded");
        }
        if let Err(err) = self.root.class_list().toggle_with_force(OPEN_CLASS, open) {
            tracing::warn!(open, error = %js_message(&err), "could not toggle open class");
        }
    }

    /// Whether `event` started inside the picker.
    pub fn contains_target(&self, event: &Event) -> bool {
        event
            .target()
            .and_then(|t| t.dyn_into::<Node>().ok())
            .is_some_and(|node| self.root.contains(Some(&node)))
    }

    /// The year token of the list entry a click landed on.
    pub fn year_from_event(event: &Event) -> Option<String> {
        let target = event.target()?.dyn_into::<Element>().ok()?;
        let entry = target.closest(&format!("[{YEAR_ATTR}]")).ok()??;
        entry.get_attribute(YEAR_ATTR)
    }

    fn append_entry(&self, entry: &PickerEntry<'_>) -> Result<(), JsValue> {
        let button = self.document.create_element("button")?;
        button.set_attribute("type", "button")?;
        button.set_attribute("role", "option")?;
        button.set_attribute(YEAR_ATTR, entry.token.as_str())?;
        button.set_attribute("aria-selected", if entry.selected { "true" } else { "false" })?;
        button.set_class_name("year-option");
        if entry.selected {
            button.class_list().add_1(SELECTED_CLASS)?;
        }
        button.set_text_content(Some(entry.label));
        self.list.append_child(&button)?;
        Ok(())
    }
}

impl YearPicker for PopoverPicker {
    fn variant(&self) -> PickerVariant {
        PickerVariant::Popover
    }

    fn render(&mut self, view: &PickerView<'_>) {
        self.toggle.set_text_content(Some(view.toggle_label()));
        self.list.set_inner_html("");
        for entry in view.entries() {
            if let Err(err) = self.append_entry(&entry) {
                tracing::warn!(year = %entry.token, error = %js_message(&err), "could not add year entry");
            }
        }
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.root.set_hidden(hidden);
    }
}

/// What the picker listeners call back into.
pub trait PickerHost {
    /// Applies a year chosen in either picker. Returns false when it was
    /// ignored.
    fn select_year(&mut self, raw: &str) -> bool;

    fn popover_event(&mut self, event: PopoverEvent);
}

/// Both pickers found on the page plus the popover's open state.
///
/// DOM listeners are added by [`bind`](Self::bind) at most once, however
/// many times the dataset arrives.
#[derive(Debug)]
pub struct YearPickers {
    document: Document,
    native: Option<NativePicker>,
    popover: Option<PopoverPicker>,
    state: PopoverState,
    bound: bool,
}

impl YearPickers {
    /// Looks up both pickers. A missing picker is logged and left out.
    pub fn find(document: &Document, config: &PickerConfig) -> Self {
        Self {
            document: document.clone(),
            native: found("native picker", NativePicker::find(document, config)),
            popover: found("popover picker", PopoverPicker::find(document, config)),
            state: PopoverState::default(),
            bound: false,
        }
    }

    /// Registers the found pickers with `selection` so they render together.
    pub fn attach(&self, selection: &mut SelectionController) {
        if let Some(picker) = &self.native {
            selection.add_picker(Box::new(picker.clone()));
        }
        if let Some(picker) = &self.popover {
            selection.add_picker(Box::new(picker.clone()));
        }
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Opening re-renders against current state before the list is shown.
    pub fn popover_event(&mut self, selection: &mut SelectionController, event: PopoverEvent) {
        let Some(picker) = self.popover.as_ref() else {
            return;
        };
        match self.state.handle(event) {
            PopoverTransition::Opened => {
                selection.render();
                picker.set_open(true);
            }
            PopoverTransition::Closed => picker.set_open(false),
            PopoverTransition::Unchanged => {}
        }
    }

    /// Adds the change, toggle, list, outside-click and Escape listeners.
    /// Returns false, adding nothing, when they are already in place.
    pub fn bind<H: PickerHost + 'static>(&mut self, host: &Rc<RefCell<H>>) -> bool {
        if self.bound {
            return false;
        }
        self.bound = true;

        if let Some(native) = &self.native {
            let select = native.select().clone();
            let host = Rc::clone(host);
            listen(native.select(), "change", move |_| {
                host.borrow_mut().select_year(&select.value());
            });
        }

        let Some(popover) = &self.popover else {
            return true;
        };

        let toggle_host = Rc::clone(host);
        listen(popover.toggle(), "click", move |_| {
            toggle_host.borrow_mut().popover_event(PopoverEvent::Toggle);
        });

        let list_host = Rc::clone(host);
        listen(popover.list(), "click", move |event: Event| {
            let Some(year) = PopoverPicker::year_from_event(&event) else {
                return;
            };
            let mut host = list_host.borrow_mut();
            host.select_year(&year);
            host.popover_event(PopoverEvent::Selected);
        });

        let outside_host = Rc::clone(host);
        let picker = popover.clone();
        listen(&self.document, "click", move |event: Event| {
            if !picker.contains_target(&event) {
                outside_host
                    .borrow_mut()
                    .popover_event(PopoverEvent::OutsideClick);
            }
        });

        let escape_host = Rc::clone(host);
        listen(&self.document, "keydown", move |event: Event| {
            let escape = event
                .dyn_ref::<KeyboardEvent>()
                .is_some_and(|k| k.key() == "Escape");
            if escape {
                escape_host.borrow_mut().popover_event(PopoverEvent::Escape);
            }
        });
        true
    }
}

fn found<T>(what: &str, lookup: Result<T, AppError>) -> Option<T> {
    lookup
        .inspect_err(|err| tracing::warn!(%err, "{what} unavailable"))
        .ok()
}
