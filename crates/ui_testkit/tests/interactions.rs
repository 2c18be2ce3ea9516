mod common;

use anyhow::Result;
use common::init_tracing;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use ui_testkit::{Event, EventKind, HarnessError, Query, Role, el, mount};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn record(log: &Log, label: &'static str) -> impl Fn(&mut Event) + 'static {
    let log = Rc::clone(log);
    move |event: &mut Event| log.borrow_mut().push(format!("{label}:{}", event.kind()))
}

fn taken(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.borrow_mut())
}

#[test]
fn typing_reports_every_intermediate_value() -> Result<()> {
    init_tracing();
    let values = log();
    let sink = Rc::clone(&values);
    let container = mount(el("input").aria_label("Query").on_input(move |event| {
        sink.borrow_mut()
            .push(event.target_value().unwrap_or_default().to_string())
    }))?;
    let field = container.get_by(&Query::label_text("Query"))?;

    container.user().type_text(&field, "ab")?;

    assert_eq!(taken(&values), vec!["a", "ab"]);
    assert_eq!(field.value()?.as_deref(), Some("ab"));
    Ok(())
}

#[test]
fn typing_into_a_controlled_field_tracks_state() -> Result<()> {
    init_tracing();
    let container = mount(ui_testkit::component("Echo", |cx| {
        let (text, set_text) = cx.use_state(String::new);
        Ok(el("div")
            .child(el("input").aria_label("Echo").value(text.clone()).on_input(
                move |event| set_text.set(event.target_value().unwrap_or_default().to_uppercase()),
            ))
            .child(el("output").child(text))
            .into())
    }))?;
    let field = container.get_by(&Query::label_text("Echo"))?;

    container.user().type_text(&field, "hey")?;

    assert_eq!(field.value()?.as_deref(), Some("HEY"));
    container.get_by(&Query::text("HEY").selector("output"))?;
    Ok(())
}

#[test]
fn click_produces_the_pointer_sequence_in_order() -> Result<()> {
    init_tracing();
    let events = log();
    let mut button = el("button").child("Press");
    for kind in [
        EventKind::PointerOver,
        EventKind::PointerDown,
        EventKind::MouseDown,
        EventKind::Focus,
        EventKind::PointerUp,
        EventKind::MouseUp,
        EventKind::Click,
    ] {
        button = button.on(kind, record(&events, "button"));
    }
    let container = mount(button)?;
    let button = container.get_by(&Query::role(Role::Button))?;

    container.user().skip_hover().click(&button)?;
    assert_eq!(
        taken(&events),
        vec![
            "button:pointerdown",
            "button:mousedown",
            "button:focus",
            "button:pointerup",
            "button:mouseup",
            "button:click",
        ]
    );

    container.user().click(&button)?;
    let with_hover = taken(&events);
    assert_eq!(with_hover.first().map(String::as_str), Some("button:pointerover"));
    assert_eq!(with_hover.last().map(String::as_str), Some("button:click"));
    Ok(())
}

#[test]
fn moving_focus_blurs_before_focusing() -> Result<()> {
    init_tracing();
    let events = log();
    let field = |label: &'static str| {
        el("input")
            .aria_label(label)
            .on(EventKind::Focus, record(&events, label))
            .on(EventKind::FocusIn, record(&events, label))
            .on(EventKind::Blur, record(&events, label))
            .on(EventKind::FocusOut, record(&events, label))
    };
    let container = mount(el("div").child(field("first")).child(field("second")))?;
    let first = container.get_by(&Query::label_text("first"))?;
    let second = container.get_by(&Query::label_text("second"))?;
    let user = container.user().skip_hover();

    user.click(&first)?;
    assert_eq!(taken(&events), vec!["first:focus", "first:focusin"]);

    user.click(&second)?;
    assert_eq!(
        taken(&events),
        vec!["first:blur", "first:focusout", "second:focus", "second:focusin"]
    );
    assert!(second.has_focus()?);
    assert_eq!(container.focused()?, Some(second));
    Ok(())
}

#[test]
fn disabled_targets_are_rejected_without_events() -> Result<()> {
    init_tracing();
    let events = log();
    let container = mount(
        el("div")
            .child(
                el("button")
                    .disabled(true)
                    .on_click(record(&events, "disabled"))
                    .child("Off"),
            )
            .child(el("input").aria_label("Locked").disabled(true))
            .child(
                el("fieldset")
                    .disabled(true)
                    .child(el("button").on_click(record(&events, "nested")).child("Nested")),
            ),
    )?;
    let user = container.user();

    let err = user
        .click(&container.get_by(&Query::role(Role::Button).name("Off"))?)
        .unwrap_err();
    let HarnessError::InvalidTarget { action, reason } = &err else {
        panic!("expected InvalidTarget, got {err:?}");
    };
    assert_eq!(*action, "click");
    assert_eq!(reason, "<button> is disabled");

    let locked = container.get_by(&Query::label_text("Locked"))?;
    assert!(user.type_text(&locked, "x").unwrap_err().is_invalid_target());
    assert_eq!(locked.value()?.as_deref(), Some(""));

    let nested = container.get_by(&Query::role(Role::Button).name("Nested"))?;
    assert!(nested.is_disabled()?);
    assert!(user.click(&nested).unwrap_err().is_invalid_target());

    assert!(taken(&events).is_empty());
    Ok(())
}

#[test]
fn typing_requires_an_editable_field() -> Result<()> {
    init_tracing();
    let container = mount(
        el("div")
            .child(el("p").child("Static"))
            .child(el("input").aria_label("Fixed").attr("readonly", "")),
    )?;
    let user = container.user();

    let err = user
        .type_text(&container.get_by(&Query::text("Static"))?, "x")
        .unwrap_err();
    assert!(err.to_string().contains("<p> is not an editable text field"));

    let err = user
        .type_text(&container.get_by(&Query::label_text("Fixed"))?, "x")
        .unwrap_err();
    assert!(err.to_string().contains("read-only"));
    Ok(())
}

#[test]
fn removed_elements_cannot_be_interacted_with() -> Result<()> {
    init_tracing();
    let container = mount(el("div").child(el("button").child("Gone soon")))?;
    let button = container.get_by(&Query::role(Role::Button))?;

    container.rerender(el("div").child(el("p").child("Replaced")))?;

    assert!(!button.is_attached());
    assert!(container.user().click(&button).unwrap_err().is_invalid_target());
    assert!(button.text_content().unwrap_err().is_invalid_target());
    Ok(())
}

#[test]
fn maxlength_stops_insertion() -> Result<()> {
    init_tracing();
    let container = mount(el("input").aria_label("Code").attr("maxlength", "3"))?;
    let field = container.get_by(&Query::label_text("Code"))?;

    container.user().type_text(&field, "abcdef")?;
    assert_eq!(field.value()?.as_deref(), Some("abc"));
    Ok(())
}

#[test]
fn special_keys_edit_the_value() -> Result<()> {
    init_tracing();
    let container = mount(
        el("div")
            .child(el("input").aria_label("Line"))
            .child(el("textarea").aria_label("Notes")),
    )?;
    let user = container.user();

    let line = container.get_by(&Query::label_text("Line"))?;
    user.type_text(&line, "abc{backspace}{backspace}d")?;
    assert_eq!(line.value()?.as_deref(), Some("ad"));

    let notes = container.get_by(&Query::label_text("Notes"))?;
    user.type_text(&notes, "one{enter}two")?;
    assert_eq!(notes.value()?.as_deref(), Some("one\ntwo"));

    user.type_text(&line, "{unknown}")?;
    assert_eq!(line.value()?.as_deref(), Some("ad{unknown}"));
    Ok(())
}

#[test]
fn keyboard_goes_to_the_focused_element() -> Result<()> {
    init_tracing();
    let container = mount(el("input").aria_label("Target"))?;
    let field = container.get_by(&Query::label_text("Target"))?;
    let user = container.user();

    user.click(&field)?;
    user.keyboard("hi")?;
    assert_eq!(field.value()?.as_deref(), Some("hi"));
    Ok(())
}

#[test]
fn tab_follows_the_sequential_focus_order() -> Result<()> {
    init_tracing();
    let container = mount(
        el("div")
            .child(el("input").aria_label("first"))
            .child(el("input").aria_label("skipped").attr("tabindex", "-1"))
            .child(el("button").disabled(true).child("disabled"))
            .child(el("input").aria_label("priority").attr("tabindex", "2"))
            .child(el("textarea").aria_label("last")),
    )?;
    let user = container.user();
    let mut visited = Vec::new();

    for _ in 0..4 {
        user.tab()?;
        let focused = container.focused()?.map(|handle| handle.accessible_name());
        visited.push(focused.transpose()?.unwrap_or_default());
    }
    assert_eq!(visited, vec!["priority", "first", "last", "priority"]);
    Ok(())
}

#[test]
fn clear_empties_with_a_single_input_event() -> Result<()> {
    init_tracing();
    let inputs = log();
    let container = mount(
        el("input")
            .aria_label("Draft")
            .attr("value", "hello")
            .on_input(record(&inputs, "draft")),
    )?;
    let field = container.get_by(&Query::label_text("Draft"))?;
    assert_eq!(field.value()?.as_deref(), Some("hello"));

    container.user().clear(&field)?;
    assert_eq!(field.value()?.as_deref(), Some(""));
    assert_eq!(taken(&inputs), vec!["draft:input"]);

    container.user().clear(&field)?;
    assert!(taken(&inputs).is_empty());
    Ok(())
}

#[test]
fn double_click_counts_clicks() -> Result<()> {
    init_tracing();
    let details = log();
    let click_log = Rc::clone(&details);
    let dbl_log = Rc::clone(&details);
    let container = mount(
        el("button")
            .on_click(move |event| click_log.borrow_mut().push(format!("click {}", event.detail())))
            .on(EventKind::DblClick, move |event| {
                dbl_log.borrow_mut().push(format!("dblclick {}", event.detail()))
            })
            .child("Twice"),
    )?;

    container
        .user()
        .dblclick(&container.get_by(&Query::role(Role::Button))?)?;
    assert_eq!(taken(&details), vec!["click 1", "click 2", "dblclick 2"]);
    Ok(())
}

#[test]
fn prevented_mousedown_keeps_focus_where_it_was() -> Result<()> {
    init_tracing();
    let container = mount(
        el("div")
            .child(el("input").aria_label("Editor"))
            .child(
                el("button")
                    .on(EventKind::MouseDown, |event| event.prevent_default())
                    .child("Bold"),
            ),
    )?;
    let editor = container.get_by(&Query::label_text("Editor"))?;
    let user = container.user();

    user.type_text(&editor, "x")?;
    user.click(&container.get_by(&Query::role(Role::Button).name("Bold"))?)?;
    assert!(editor.has_focus()?);
    Ok(())
}

#[test]
fn stopped_propagation_hides_the_click_from_ancestors() -> Result<()> {
    init_tracing();
    let events = log();
    let inner = Rc::clone(&events);
    let container = mount(
        el("div").on_click(record(&events, "outer")).child(
            el("button")
                .on_click(move |event| {
                    event.stop_propagation();
                    inner.borrow_mut().push("inner".into());
                })
                .child("Inner"),
        ),
    )?;

    container
        .user()
        .click(&container.get_by(&Query::role(Role::Button))?)?;
    assert_eq!(taken(&events), vec!["inner"]);
    Ok(())
}

#[test]
fn only_submit_buttons_submit_their_form() -> Result<()> {
    init_tracing();
    let submits = log();
    let container = mount(
        el("form")
            .on_submit(record(&submits, "form"))
            .child(el("button").attr("type", "button").child("Preview"))
            .child(el("button").child("Send")),
    )?;
    let user = container.user();

    user.click(&container.get_by(&Query::role(Role::Button).name("Preview"))?)?;
    assert!(taken(&submits).is_empty());

    user.click(&container.get_by(&Query::role(Role::Button).name("Send"))?)?;
    assert_eq!(taken(&submits), vec!["form:submit"]);
    Ok(())
}

#[test]
fn clicking_a_wrapping_label_clicks_its_control() -> Result<()> {
    init_tracing();
    let events = log();
    let container = mount(
        el("label").child("Agree").child(
            el("input")
                .attr("type", "checkbox")
                .on_click(record(&events, "checkbox")),
        ),
    )?;
    let checkbox = container.get_by(&Query::role(Role::Checkbox).name("Agree"))?;

    container
        .user()
        .click(&container.get_by(&Query::text("Agree"))?)?;
    assert_eq!(taken(&events), vec!["checkbox:click"]);
    assert!(checkbox.has_focus()?);
    Ok(())
}

#[test]
fn fire_input_sets_the_value_in_one_step() -> Result<()> {
    init_tracing();
    let inputs = log();
    let container = mount(
        el("div")
            .child(el("input").aria_label("Amount").on_input(record(&inputs, "amount")))
            .child(el("p").child("Label")),
    )?;
    let field = container.get_by(&Query::label_text("Amount"))?;

    container.fire_input(&field, "42")?;
    assert_eq!(field.value()?.as_deref(), Some("42"));
    assert_eq!(taken(&inputs), vec!["amount:input"]);

    let paragraph = container.get_by(&Query::text("Label"))?;
    assert!(container.fire_input(&paragraph, "x").unwrap_err().is_invalid_target());
    Ok(())
}
