//! Scripted driver for the grouping core: feeds a canned roster session
//! through the pipeline and logs every layout reload the host would see.

use tracing::info;

use grouping_core::{
    build_grouping_app, pump, AssignedRole, Class, GroupingMetrics, HostEvent, MemberId,
    RosterSignal, SpecId,
};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (mut app, handle) = build_grouping_app();

    let joins = [
        (1u64, "Ashka", "WARRIOR"),
        (2, "Brenn", "PRIEST"),
        (3, "Cado", "HUNTER"),
        (4, "Dreya", "DRUID"),
    ];
    for (id, name, class) in joins {
        handle
            .signals
            .send(RosterSignal::Joined {
                member: MemberId(id),
                name: name.to_string(),
                pet: false,
            })
            .expect("core dropped its signal feed");
        if let Ok(class) = class.parse::<Class>() {
            handle
                .signals
                .send(RosterSignal::ClassKnown {
                    member: MemberId(id),
                    class,
                })
                .expect("core dropped its signal feed");
        }
    }
    handle
        .signals
        .send(RosterSignal::PartySize {
            members: 4,
            instance_cap: None,
        })
        .expect("core dropped its signal feed");
    pump(&mut app);
    drain_events(&handle);

    // Inspections resolve out of order; the warrior turns out to be a tank.
    for (id, spec) in [(1u64, 73u16), (4, 105), (3, 253), (2, 257)] {
        handle
            .signals
            .send(RosterSignal::SpecInfo {
                member: MemberId(id),
                spec: Some(SpecId(spec)),
            })
            .expect("core dropped its signal feed");
        pump(&mut app);
        drain_events(&handle);
    }

    // Raid leader marks the priest as the tank's co-tank for a pull.
    handle
        .signals
        .send(RosterSignal::Assigned {
            member: MemberId(2),
            role: AssignedRole::Tank,
        })
        .expect("core dropped its signal feed");
    pump(&mut app);
    drain_events(&handle);

    handle
        .signals
        .send(RosterSignal::Left { member: MemberId(3) })
        .expect("core dropped its signal feed");
    pump(&mut app);
    drain_events(&handle);

    let metrics = app.world.resource::<GroupingMetrics>();
    info!(
        target: "role_grid::harness",
        resolves = metrics.resolves,
        transitions = metrics.role_transitions,
        inspect_requests = metrics.inspect_requests,
        reloads = metrics.layout_reloads,
        suppressed = metrics.suppressed_reloads,
        "session complete"
    );
}

fn drain_events(handle: &grouping_core::GroupingHandle) {
    while let Ok(event) = handle.events.try_recv() {
        match event {
            HostEvent::InspectRequest { member } => {
                info!(target: "role_grid::harness", %member, "inspect requested");
            }
            HostEvent::LayoutChanged(descriptor) => {
                let json = serde_json::to_string(&descriptor)
                    .unwrap_or_else(|err| format!("<serialize failed: {err}>"));
                info!(target: "role_grid::harness", layout = %json, "layout reload");
            }
        }
    }
}
