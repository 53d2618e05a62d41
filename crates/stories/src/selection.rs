use std::rc::Rc;

use formats::StoryCollection;

use crate::filter::apply_year_filter;
use crate::picker::{PickerVariant, PickerView, YearPicker};
use crate::years::{YearIndex, YearToken, build_year_index};

/// Owns the loaded dataset, its year index and the active selection, and
/// keeps every registered picker in step with them.
///
/// Until [`load`](Self::load) runs, selections are ignored: the index holds
/// only `All` and there is nothing to filter.
pub struct SelectionController {
    full: Option<Rc<StoryCollection>>,
    index: YearIndex,
    selected: YearToken,
    visible: PickerVariant,
    all_label: String,
    pickers: Vec<Box<dyn YearPicker>>,
}

impl std::fmt::Debug for SelectionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionController")
            .field("loaded", &self.full.is_some())
            .field("index", &self.index)
            .field("selected", &self.selected)
            .field("visible", &self.visible)
            .field("pickers", &self.pickers.len())
            .finish()
    }
}

impl SelectionController {
    pub fn new(visible: PickerVariant, all_label: impl Into<String>) -> Self {
        Self {
            full: None,
            index: YearIndex::default(),
            selected: YearToken::All,
            visible,
            all_label: all_label.into(),
            pickers: Vec::new(),
        }
    }

    /// Registers a picker, hiding it unless it is the visible variant, and
    /// renders current state into it.
    pub fn add_picker(&mut self, mut picker: Box<dyn YearPicker>) {
        picker.set_hidden(picker.variant() != self.visible);
        picker.render(&PickerView {
            index: &self.index,
            selected: &self.selected,
            all_label: &self.all_label,
        });
        self.pickers.push(picker);
    }

    /// Installs the full dataset, rebuilds the index and resets the
    /// selection to `All`. Returns the collection to display.
    pub fn load(&mut self, full: StoryCollection) -> Rc<StoryCollection> {
        let full = Rc::new(full);
        self.index = build_year_index(&full);
        self.selected = YearToken::All;
        self.full = Some(Rc::clone(&full));
        tracing::info!(
            stories = full.len(),
            years = self.index.years().len(),
            "story dataset loaded"
        );
        self.render();
        full
    }

    /// Makes `year` the active selection and returns the collection to
    /// display. Returns `None`, changing nothing, before the dataset is
    /// loaded or when `year` is not in the index.
    pub fn select(&mut self, year: YearToken) -> Option<Rc<StoryCollection>> {
        let full = self.full.as_ref()?;
        if !self.index.contains(&year) {
            tracing::debug!(year = %year, "ignoring selection of unknown year");
            return None;
        }
        let shown = apply_year_filter(full, &year);
        self.selected = year;
        self.render();
        Some(shown)
    }

    /// The collection matching the current selection.
    pub fn displayed(&self) -> Option<Rc<StoryCollection>> {
        self.full
            .as_ref()
            .map(|full| apply_year_filter(full, &self.selected))
    }

    pub fn selected(&self) -> &YearToken {
        &self.selected
    }

    pub fn index(&self) -> &YearIndex {
        &self.index
    }

    pub fn is_loaded(&self) -> bool {
        self.full.is_some()
    }

    pub fn visible_variant(&self) -> PickerVariant {
        self.visible
    }

    /// Switches which picker is shown. Both are already up to date.
    pub fn set_visible_variant(&mut self, visible: PickerVariant) {
        self.visible = visible;
        for picker in &mut self.pickers {
            picker.set_hidden(picker.variant() != visible);
        }
    }

    /// Pushes current state into every picker, hidden ones included.
    pub fn render(&mut self) {
        let view = PickerView {
            index: &self.index,
            selected: &self.selected,
            all_label: &self.all_label,
        };
        for picker in &mut self.pickers {
            picker.render(&view);
        }
    }
}
