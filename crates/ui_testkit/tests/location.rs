mod common;

use anyhow::Result;
use common::{async_location_display, init_tracing, location_display};
use ui_testkit::{
    FakeGeolocation, HarnessError, MountOptions, Position, PositionError, PositionErrorCode,
    Query, RenderError, Role, deferred, mount, mount_with,
};

fn mount_location(fake: &FakeGeolocation) -> ui_testkit::Result<ui_testkit::Container> {
    mount_with(location_display(), MountOptions::new().service(fake.shared()))
}

#[test]
fn shows_spinner_then_coordinates() -> Result<()> {
    init_tracing();
    let fake = FakeGeolocation::new();
    let container = mount_location(&fake)?;

    container.get_by(&Query::label_text("loading"))?;
    assert_eq!(fake.pending_requests(), 1);

    container.act(|| fake.resolve(Position::new(35.0, 139.0)))?;

    assert!(container.query_by(&Query::label_text("loading"))?.is_none());
    container.get_by(&Query::text("Latitude: 35"))?;
    container.get_by(&Query::text("Longitude: 139"))?;
    assert_eq!(fake.total_requests(), 1);
    Ok(())
}

#[test]
fn shows_error_when_position_is_rejected() -> Result<()> {
    init_tracing();
    let fake = FakeGeolocation::new();
    let container = mount_location(&fake)?;

    container.act(|| {
        fake.reject(PositionError::new(
            PositionErrorCode::PermissionDenied,
            "Geolocation is not supported",
        ))
    })?;

    let alert = container.get_by(&Query::role(Role::Alert))?;
    assert_eq!(alert.text_content()?, "Geolocation is not supported");
    Ok(())
}

#[test]
fn fakes_are_scoped_to_their_container() -> Result<()> {
    init_tracing();
    let first = FakeGeolocation::new();
    let second = FakeGeolocation::new();
    let first_container = mount_location(&first)?;
    let second_container = mount_location(&second)?;

    first_container.act(|| first.resolve(Position::new(1.0, 2.0)))?;

    first_container.get_by(&Query::text("Latitude: 1"))?;
    second_container.get_by(&Query::label_text("loading"))?;
    assert_eq!(second.pending_requests(), 1);
    Ok(())
}

#[test]
fn missing_service_fails_the_mount() {
    init_tracing();
    let err = mount(location_display()).unwrap_err();
    assert!(matches!(
        err,
        HarnessError::InvalidTree(RenderError::MissingService(_))
    ));
}

#[test]
fn deferred_position_resolves_inside_act_async() -> Result<()> {
    init_tracing();
    let (promise, resolver) = deferred::<Position>();
    let container = mount(async_location_display(promise))?;
    container.get_by(&Query::label_text("loading"))?;

    let delivered = container.act_async(async move { resolver.resolve(Position::new(51.5, -0.1)) })?;

    assert!(delivered);
    container.get_by(&Query::text("Latitude: 51.5"))?;
    container.get_by(&Query::text("Longitude: -0.1"))?;
    Ok(())
}

#[test]
fn deferred_rejection_is_rendered() -> Result<()> {
    init_tracing();
    let (promise, resolver) = deferred::<Position>();
    let container = mount(async_location_display(promise))?;

    container.act_async(async move { resolver.reject("timed out") })?;

    let alert = container.find_by(&Query::role(Role::Alert))?;
    assert_eq!(alert.text_content()?, "rejected: timed out");
    Ok(())
}
