mod common;

use anyhow::Result;
use common::{CounterOptions, init_tracing, use_counter};
use std::cell::Cell;
use std::rc::Rc;
use ui_testkit::render_hook;

#[test]
fn starts_at_the_initial_count() -> Result<()> {
    init_tracing();
    let result = render_hook(|cx| {
        use_counter(
            cx,
            CounterOptions {
                initial_count: 3,
                ..CounterOptions::default()
            },
        )
    })?;
    assert_eq!(result.current()?.count, 3);
    Ok(())
}

#[test]
fn increment_and_decrement_use_the_step() -> Result<()> {
    init_tracing();
    let result = render_hook(|cx| {
        use_counter(
            cx,
            CounterOptions {
                initial_count: 0,
                step: 2,
            },
        )
    })?;

    let counter = result.current()?;
    result.act(|| counter.increment())?;
    assert_eq!(result.current()?.count, 2);

    let counter = result.current()?;
    result.act(|| {
        counter.decrement();
        counter.decrement();
    })?;
    assert_eq!(result.current()?.count, -2);
    Ok(())
}

#[test]
fn updates_outside_act_are_not_visible() -> Result<()> {
    init_tracing();
    let result = render_hook(|cx| use_counter(cx, CounterOptions::default()))?;
    let renders = result.render_count();

    result.current()?.increment();
    assert_eq!(result.current()?.count, 0);
    assert_eq!(result.render_count(), renders);

    // The next boundary applies what was queued.
    result.act(|| ())?;
    assert_eq!(result.current()?.count, 1);
    Ok(())
}

#[test]
fn rerender_picks_up_a_new_step_and_keeps_the_count() -> Result<()> {
    init_tracing();
    let step = Rc::new(Cell::new(1));
    let options = Rc::clone(&step);
    let result = render_hook(move |cx| {
        use_counter(
            cx,
            CounterOptions {
                initial_count: 0,
                step: options.get(),
            },
        )
    })?;

    let counter = result.current()?;
    result.act(|| counter.increment())?;
    assert_eq!(result.current()?.count, 1);

    step.set(10);
    result.rerender()?;
    let counter = result.current()?;
    result.act(|| counter.increment())?;
    assert_eq!(result.current()?.count, 11);
    Ok(())
}

#[test]
fn current_always_reflects_the_latest_render() -> Result<()> {
    init_tracing();
    let result = render_hook(|cx| use_counter(cx, CounterOptions::default()))?;
    let stale = result.current()?;
    result.act(|| stale.increment())?;
    result.act(|| result.current().map(|counter| counter.increment()))??;

    assert_eq!(stale.count, 0);
    assert_eq!(result.current()?.count, 2);
    assert_eq!(result.render_count(), 3);
    Ok(())
}

#[test]
fn reading_after_unmount_fails() -> Result<()> {
    init_tracing();
    let result = render_hook(|cx| use_counter(cx, CounterOptions::default()))?;
    result.unmount();
    assert!(result.current().unwrap_err().is_invalid_target());
    Ok(())
}
