//! Example components and helpers shared by the integration tests.

#![allow(dead_code)]

use fake::Dummy;
use fake::faker::internet::en::{Password, Username};
use std::rc::Rc;
use std::sync::Once;
use ui_testkit::{
    Container, Position, Scope, Setter, SharedGeolocation, View, component, el,
    mount_with_wrapper, provide,
};

pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// "Current count: N" with decrement and increment buttons.
pub fn counter() -> View {
    component("Counter", |cx| {
        let (count, set_count) = cx.use_state(|| 0_i64);
        let decrement = set_count.clone();
        let increment = set_count;
        Ok(el("div")
            .child(el("div").child("Current count: ").child(count.to_string()))
            .child(
                el("button")
                    .on_click(move |_| decrement.update(|count| *count -= 1))
                    .child("Decrement"),
            )
            .child(
                el("button")
                    .on_click(move |_| increment.update(|count| *count += 1))
                    .child("Increment"),
            )
            .into())
    })
}

#[derive(Debug, Clone, PartialEq, Dummy)]
pub struct Credentials {
    #[dummy(faker = "Username()")]
    pub username: String,
    #[dummy(faker = "Password(8..16)")]
    pub password: String,
}

/// Controlled username/password form that reports submissions.
pub fn login_form(on_submit: impl Fn(Credentials) + 'static) -> View {
    let on_submit = Rc::new(on_submit);
    component("LoginForm", move |cx| {
        let (username, set_username) = cx.use_state(String::new);
        let (password, set_password) = cx.use_state(String::new);

        let submit = Rc::clone(&on_submit);
        let credentials = Credentials {
            username: username.clone(),
            password: password.clone(),
        };

        Ok(el("form")
            .on_submit(move |event| {
                event.prevent_default();
                submit(credentials.clone());
            })
            .child(
                el("div")
                    .child(el("label").attr("for", "username-field").child("Username"))
                    .child(
                        el("input")
                            .id("username-field")
                            .value(username)
                            .on_input(move |event| {
                                set_username.set(event.target_value().unwrap_or_default().to_string())
                            }),
                    ),
            )
            .child(
                el("div")
                    .child(el("label").attr("for", "password-field").child("Password"))
                    .child(
                        el("input")
                            .id("password-field")
                            .attr("type", "password")
                            .value(password)
                            .on_input(move |event| {
                                set_password.set(event.target_value().unwrap_or_default().to_string())
                            }),
                    ),
            )
            .child(el("button").attr("type", "submit").child("Submit"))
            .into())
    })
}

#[derive(Debug, Clone, PartialEq)]
enum LocationState {
    Loading,
    Ready(Position),
    Failed(String),
}

fn location_view(state: &LocationState) -> View {
    match state {
        LocationState::Loading => el("div")
            .child(el("span").aria_label("loading").child("..."))
            .into(),
        LocationState::Ready(position) => el("div")
            .child(el("div").child(format!("Latitude: {}", position.coords.latitude)))
            .child(el("div").child(format!("Longitude: {}", position.coords.longitude)))
            .into(),
        LocationState::Failed(message) => el("div")
            .child(el("div").role("alert").child(message.clone()))
            .into(),
    }
}

/// Shows a spinner until the injected geolocation service answers.
pub fn location_display() -> View {
    component("LocationDisplay", |cx| {
        let geolocation: SharedGeolocation = cx.require_service()?;
        let (state, set_state) = cx.use_state(|| LocationState::Loading);

        cx.use_effect((), move || {
            let on_error = set_state.clone();
            geolocation.get_current_position(
                Box::new(move |position| set_state.set(LocationState::Ready(position))),
                Box::new(move |error| on_error.set(LocationState::Failed(error.message))),
            );
        });

        Ok(location_view(&state))
    })
}

/// Same display, fed by a future instead of callbacks.
pub fn async_location_display(position: ui_testkit::Promise<Position>) -> View {
    let pending = Rc::new(std::cell::RefCell::new(Some(position)));
    component("AsyncLocationDisplay", move |cx| {
        let (state, set_state) = cx.use_state(|| LocationState::Loading);
        let spawner = cx.spawner();
        let pending = Rc::clone(&pending);

        cx.use_effect((), move || {
            let Some(promise) = pending.borrow_mut().take() else {
                return;
            };
            spawner.spawn(async move {
                match promise.await {
                    Ok(position) => set_state.set(LocationState::Ready(position)),
                    Err(err) => set_state.set(LocationState::Failed(err.to_string())),
                }
            });
        });

        Ok(location_view(&state))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

#[derive(Clone)]
pub struct ThemeContext {
    pub theme: Theme,
    pub set_theme: Setter<Theme>,
}

pub fn theme_provider(initial: Theme, child: View) -> View {
    component("ThemeProvider", move |cx| {
        let (theme, set_theme) = cx.use_state(|| initial);
        Ok(provide(ThemeContext { theme, set_theme }, child.clone()))
    })
}

/// A button styled from the theme context.
pub fn easy_button(label: &str) -> View {
    let label = label.to_string();
    component("EasyButton", move |cx| {
        let context: ThemeContext = cx.require_context()?;
        let (background, color) = match context.theme {
            Theme::Light => ("white", "black"),
            Theme::Dark => ("black", "white"),
        };
        Ok(el("button")
            .style("background-color", background)
            .style("color", color)
            .child(label.clone())
            .into())
    })
}

pub fn theme_toggle() -> View {
    component("ThemeToggle", |cx| {
        let context: ThemeContext = cx.require_context()?;
        let next = match context.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        Ok(el("button")
            .on_click(move |_| context.set_theme.set(next))
            .child("Toggle theme")
            .into())
    })
}

pub fn mount_with_theme(view: View, initial: Theme) -> ui_testkit::Result<Container> {
    mount_with_wrapper(view, move |child| theme_provider(initial, child))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOptions {
    pub initial_count: i64,
    pub step: i64,
}

impl Default for CounterOptions {
    fn default() -> Self {
        Self {
            initial_count: 0,
            step: 1,
        }
    }
}

#[derive(Clone)]
pub struct Counter {
    pub count: i64,
    set_count: Setter<i64>,
    step: i64,
}

impl std::fmt::Debug for Counter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Counter")
            .field("count", &self.count)
            .field("step", &self.step)
            .finish_non_exhaustive()
    }
}

impl Counter {
    pub fn increment(&self) {
        let step = self.step;
        self.set_count.update(move |count| *count += step);
    }

    pub fn decrement(&self) {
        let step = self.step;
        self.set_count.update(move |count| *count -= step);
    }
}

pub fn use_counter(cx: &mut Scope<'_>, options: CounterOptions) -> Counter {
    let (count, set_count) = cx.use_state(|| options.initial_count);
    Counter {
        count,
        set_count,
        step: options.step,
    }
}
