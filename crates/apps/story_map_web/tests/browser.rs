#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use formats::StoryCollection;
use stories::{
    EntityDecoder, HtmlEntityDecoder, PickerConfig, PickerVariant, PopoverEvent,
    SelectionController, YearToken,
};
use story_map_web::dom::{PageDecoder, element_by_id};
use story_map_web::pickers::{PickerHost, YearPickers};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, Event, HtmlElement, HtmlSelectElement, KeyboardEvent, KeyboardEventInit};

wasm_bindgen_test_configure!(run_in_browser);

const DATASET: &str = r#"{"type":"FeatureCollection","features":[
    {"type":"Feature","geometry":{"type":"Point","coordinates":[0,0]},"properties":{"year":"2019"}},
    {"type":"Feature","geometry":{"type":"Point","coordinates":[1,1]},"properties":{"year":"2021"}}
]}"#;

struct Page {
    selection: SelectionController,
    pickers: YearPickers,
}

impl PickerHost for Page {
    fn select_year(&mut self, raw: &str) -> bool {
        self.selection.select(YearToken::parse(raw)).is_some()
    }

    fn popover_event(&mut self, event: PopoverEvent) {
        self.pickers.popover_event(&mut self.selection, event);
    }
}

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

// Each test gets its own element ids; listeners from earlier tests stay on
// the document.
fn mount(name: &str) -> PickerConfig {
    let document = document();
    let host = document.create_element("section").unwrap();
    host.set_inner_html(&format!(
        r#"<div id="{name}-filter"><select id="{name}-select"></select></div>
           <div id="{name}-picker">
             <button id="{name}-toggle" type="button"></button>
             <div id="{name}-list" hidden></div>
           </div>
           <p id="{name}-elsewhere">elsewhere</p>"#
    ));
    document.body().unwrap().append_child(&host).unwrap();
    PickerConfig {
        variant: PickerVariant::Popover,
        native_root_id: format!("{name}-filter"),
        native_select_id: format!("{name}-select"),
        popover_root_id: format!("{name}-picker"),
        popover_toggle_id: format!("{name}-toggle"),
        popover_list_id: format!("{name}-list"),
        all_label: "All years".to_string(),
    }
}

fn page(config: &PickerConfig) -> Rc<RefCell<Page>> {
    let document = document();
    let mut selection = SelectionController::new(config.variant, config.all_label.clone());
    let pickers = YearPickers::find(&document, config);
    pickers.attach(&mut selection);
    selection.load(StoryCollection::from_geojson_str(DATASET).unwrap());

    let page = Rc::new(RefCell::new(Page { selection, pickers }));
    assert!(page.borrow_mut().pickers.bind(&page));
    page
}

fn element(id: &str) -> HtmlElement {
    element_by_id(&document(), id).unwrap()
}

fn is_open(page: &Rc<RefCell<Page>>, config: &PickerConfig) -> bool {
    let open = page.borrow().pickers.is_open();
    assert_eq!(open, !element(&config.popover_list_id).hidden());
    open
}

fn press_escape() {
    let init = KeyboardEventInit::new();
    init.set_key("Escape");
    init.set_bubbles(true);
    let event = KeyboardEvent::new_with_keyboard_event_init_dict("keydown", &init).unwrap();
    document().dispatch_event(&event).unwrap();
}

#[wasm_bindgen_test]
fn binding_twice_adds_listeners_once() {
    let config = mount("bind-once");
    let page = page(&config);
    assert!(!page.borrow_mut().pickers.bind(&page));
    assert!(page.borrow().pickers.is_bound());

    element(&config.popover_toggle_id).click();
    assert!(is_open(&page, &config));

    element(&config.popover_toggle_id).click();
    assert!(!is_open(&page, &config));
}

#[wasm_bindgen_test]
fn click_outside_closes_popover() {
    let config = mount("outside");
    let page = page(&config);
    element(&config.popover_toggle_id).click();
    assert!(is_open(&page, &config));

    // Clicks inside the picker keep it open.
    element(&config.popover_root_id).click();
    assert!(is_open(&page, &config));

    element("outside-elsewhere").click();
    assert!(!is_open(&page, &config));
}

#[wasm_bindgen_test]
fn escape_closes_popover() {
    let config = mount("escape");
    let page = page(&config);
    element(&config.popover_toggle_id).click();
    assert!(is_open(&page, &config));

    press_escape();
    assert!(!is_open(&page, &config));
}

#[wasm_bindgen_test]
fn native_change_updates_popover() {
    let config = mount("native-change");
    let page = page(&config);

    let select: HtmlSelectElement = element_by_id(&document(), &config.native_select_id).unwrap();
    assert_eq!(select.length(), 3);
    select.set_value("2019");
    select.dispatch_event(&Event::new("change").unwrap()).unwrap();

    assert_eq!(page.borrow().selection.selected(), &YearToken::parse("2019"));
    let toggle = element(&config.popover_toggle_id);
    assert_eq!(toggle.text_content().as_deref(), Some("2019"));

    let list = element(&config.popover_list_id);
    let chosen = list.query_selector(r#"[data-year="2019"]"#).unwrap().unwrap();
    assert_eq!(chosen.get_attribute("aria-selected").as_deref(), Some("true"));
}

#[wasm_bindgen_test]
fn list_entry_selects_and_closes() {
    let config = mount("list-entry");
    let page = page(&config);
    element(&config.popover_toggle_id).click();
    assert!(is_open(&page, &config));

    let list = element(&config.popover_list_id);
    let entry: HtmlElement = list
        .query_selector(r#"[data-year="2021"]"#)
        .unwrap()
        .unwrap()
        .dyn_into()
        .unwrap();
    entry.click();

    assert!(!is_open(&page, &config));
    assert_eq!(page.borrow().selection.selected(), &YearToken::parse("2021"));
    let select: HtmlSelectElement = element_by_id(&document(), &config.native_select_id).unwrap();
    assert_eq!(select.value(), "2021");
}

#[wasm_bindgen_test]
fn unknown_year_from_native_is_ignored() {
    let config = mount("unknown-year");
    let page = page(&config);
    assert!(!page.borrow_mut().select_year("1850"));
    assert!(page.borrow().selection.selected().is_all());
}

#[wasm_bindgen_test]
fn page_decoder_matches_builtin_decoder() {
    let page = PageDecoder::new(&document());
    assert!(matches!(page, PageDecoder::Textarea(_)));
    for raw in [
        "A &amp; B",
        "Tom &amp Jerry",
        "&hearts; &copy 2020",
        "&#150; &#128; &#x2014;",
        "&notit; &notin;",
        "&bogus; & fish",
        "&lt;script&gt;",
    ] {
        assert_eq!(page.decode(raw), HtmlEntityDecoder.decode(raw), "{raw}");
    }
}
