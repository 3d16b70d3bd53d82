// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end layer switching driven by the blend mode and geometry.

mod common;

use common::{add_node, assert_layer_invariants, frame, session};
use passthrough_core::{
    PassthroughSignal, SceneNotification, COMPOSITION_LAYER_ORDER, SIGNAL_BACKLOG,
};
use passthrough_port::{
    BlendMode, CompositionLayerFlags, CompositionLayerProvider, LayerPurpose, RuntimeCall,
    RuntimeEvent, StateChangedFlags,
};

#[test]
fn alpha_blend_starts_reconstruction_once() {
    let mut s = session();
    s.host_mut().blend_mode = Some(BlendMode::AlphaBlend);
    s.on_state_ready();
    frame(&mut s, BlendMode::AlphaBlend);
    frame(&mut s, BlendMode::AlphaBlend);

    assert_eq!(
        s.current_passthrough_layer(),
        Some(LayerPurpose::Reconstruction)
    );
    assert_eq!(s.runtime().call_count(RuntimeCall::CreateLayer), 1);
    assert_eq!(s.runtime().call_count(RuntimeCall::StartPassthrough), 1);
    assert_layer_invariants(&s);
}

#[test]
fn leaving_alpha_blend_switches_to_projected_geometry() {
    let mut s = session();
    frame(&mut s, BlendMode::AlphaBlend);
    let node = add_node(&mut s);
    assert!(s.geometry_node(node).unwrap().instance().is_none());
    s.drain_signals();

    frame(&mut s, BlendMode::Opaque);

    assert_eq!(s.current_passthrough_layer(), Some(LayerPurpose::Projected));
    let (_, reconstruction) = s
        .runtime()
        .layer_for(LayerPurpose::Reconstruction)
        .unwrap();
    assert!(!reconstruction.running);
    assert_eq!(
        s.drain_signals(),
        vec![PassthroughSignal::ProjectedLayerCreated]
    );
    assert!(s.geometry_node(node).unwrap().instance().is_some());
    assert_eq!(s.runtime().instances.len(), 1);
    assert_layer_invariants(&s);
}

#[test]
fn last_node_leaving_stops_passthrough_next_frame() {
    let mut s = session();
    let node = add_node(&mut s);
    frame(&mut s, BlendMode::Opaque);
    assert_eq!(s.geometry_instance_count(), 1);
    s.drain_signals();

    s.notify_geometry(node, SceneNotification::ExitTree).unwrap();
    assert_eq!(s.geometry_instance_count(), 0);
    assert!(s.runtime().instances.is_empty());
    assert!(s.runtime().meshes.is_empty());
    assert_eq!(s.current_passthrough_layer(), Some(LayerPurpose::Projected));

    frame(&mut s, BlendMode::Opaque);
    assert_eq!(s.current_passthrough_layer(), None);
    assert_eq!(s.drain_signals(), vec![PassthroughSignal::PassthroughStopped]);
    assert!(!s.is_passthrough_started());
    assert_layer_invariants(&s);
}

#[test]
fn reinit_event_stops_before_next_frame() {
    let mut s = session();
    frame(&mut s, BlendMode::AlphaBlend);
    s.drain_signals();

    let consumed = s.on_event_polled(&RuntimeEvent::PassthroughStateChanged(
        StateChangedFlags::REINIT_REQUIRED,
    ));

    assert!(consumed);
    assert_eq!(s.current_passthrough_layer(), None);
    assert!(s.runtime().layers.is_empty());
    assert_eq!(s.drain_signals(), vec![PassthroughSignal::PassthroughStopped]);
    assert_layer_invariants(&s);

    frame(&mut s, BlendMode::AlphaBlend);
    assert_eq!(
        s.current_passthrough_layer(),
        Some(LayerPurpose::Reconstruction)
    );
}

#[test]
fn layer_creation_failure_falls_back_to_stop() {
    let mut s = session();
    add_node(&mut s);
    s.runtime_mut().fail_next(RuntimeCall::CreateLayer);

    frame(&mut s, BlendMode::Opaque);

    assert_eq!(s.current_passthrough_layer(), None);
    assert_eq!(s.geometry_instance_count(), 0);
    assert!(s.runtime().instances.is_empty());
    assert_eq!(s.drain_signals(), vec![PassthroughSignal::PassthroughStopped]);
    assert_layer_invariants(&s);

    frame(&mut s, BlendMode::Opaque);
    assert_eq!(s.current_passthrough_layer(), Some(LayerPurpose::Projected));
    assert_eq!(s.geometry_instance_count(), 1);
}

#[test]
fn undrained_signals_stay_bounded_while_retrying() {
    let mut s = session();
    s.runtime_mut().fail_always(RuntimeCall::CreateLayer);
    for _ in 0..1000 {
        frame(&mut s, BlendMode::AlphaBlend);
    }
    assert_eq!(s.current_passthrough_layer(), None);

    let signals = s.drain_signals();
    assert_eq!(signals.len(), SIGNAL_BACKLOG);
    assert!(signals
        .iter()
        .all(|sig| *sig == PassthroughSignal::PassthroughStopped));
    assert!(s.drain_signals().is_empty());
}

#[test]
fn switching_back_resumes_instead_of_recreating() {
    let mut s = session();
    let node = add_node(&mut s);
    frame(&mut s, BlendMode::Opaque);
    frame(&mut s, BlendMode::AlphaBlend);
    frame(&mut s, BlendMode::Opaque);
    frame(&mut s, BlendMode::AlphaBlend);

    assert_eq!(s.runtime().call_count(RuntimeCall::CreateLayer), 2);
    assert_eq!(s.runtime().call_count(RuntimeCall::ResumeLayer), 2);
    assert_eq!(s.runtime().call_count(RuntimeCall::PauseLayer), 3);
    assert!(s.geometry_node(node).unwrap().instance().is_some());
    assert_layer_invariants(&s);
}

#[test]
fn pause_and_resume_failures_do_not_block_the_switch() {
    let mut s = session();
    add_node(&mut s);
    frame(&mut s, BlendMode::AlphaBlend);
    s.runtime_mut().fail_next(RuntimeCall::PauseLayer);
    frame(&mut s, BlendMode::Opaque);
    assert_eq!(s.current_passthrough_layer(), Some(LayerPurpose::Projected));

    s.runtime_mut().fail_next(RuntimeCall::ResumeLayer);
    frame(&mut s, BlendMode::AlphaBlend);
    assert_eq!(
        s.current_passthrough_layer(),
        Some(LayerPurpose::Reconstruction)
    );
}

#[test]
fn start_failure_stops_and_retries_later() {
    let mut s = session();
    s.runtime_mut().fail_next(RuntimeCall::StartPassthrough);
    frame(&mut s, BlendMode::AlphaBlend);
    assert_eq!(s.current_passthrough_layer(), None);
    assert!(!s.is_passthrough_started());
    assert_eq!(s.runtime().call_count(RuntimeCall::CreateLayer), 0);

    frame(&mut s, BlendMode::AlphaBlend);
    assert_eq!(
        s.current_passthrough_layer(),
        Some(LayerPurpose::Reconstruction)
    );
}

#[test]
fn ensure_started_is_idempotent_through_the_session() {
    let mut s = session();
    assert!(s.ensure_started());
    assert!(s.ensure_started());
    assert_eq!(s.runtime().call_count(RuntimeCall::StartPassthrough), 1);
    assert_eq!(s.runtime().call_count(RuntimeCall::CreatePassthrough), 1);
}

#[test]
fn stop_all_when_idle_emits_nothing() {
    let mut s = session();
    s.stop_all();
    assert!(s.drain_signals().is_empty());
    assert_eq!(s.runtime().call_count(RuntimeCall::PausePassthrough), 0);
}

#[test]
fn explicit_projected_without_nodes_is_allowed() {
    let mut s = session();
    s.start_layer(LayerPurpose::Projected);
    assert_eq!(s.current_passthrough_layer(), Some(LayerPurpose::Projected));
    assert_eq!(
        s.drain_signals(),
        vec![PassthroughSignal::ProjectedLayerCreated]
    );

    frame(&mut s, BlendMode::Opaque);
    assert_eq!(s.current_passthrough_layer(), None);
}

#[test]
fn compositor_sees_only_the_current_layer() {
    let mut s = session();
    assert_eq!(s.composition_layer_count(), 0);
    assert_eq!(s.composition_layer(0), None);

    frame(&mut s, BlendMode::AlphaBlend);
    let handle = s.layer_handle(LayerPurpose::Reconstruction).unwrap();
    assert_eq!(s.composition_layer_count(), 1);
    let layer = s.composition_layer(0).unwrap();
    assert_eq!(layer.layer, handle);
    assert_eq!(
        layer.flags,
        CompositionLayerFlags::BLEND_TEXTURE_SOURCE_ALPHA
    );
    assert_eq!(layer.space, None);
    assert_eq!(s.composition_layer(1), None);
    assert_eq!(s.composition_layer_order(0), COMPOSITION_LAYER_ORDER);

    s.stop_all();
    assert_eq!(s.composition_layer_count(), 0);
}

#[test]
fn state_events_are_signalled_in_bit_order() {
    use passthrough_core::PassthroughStateEvent;

    let mut s = session();
    frame(&mut s, BlendMode::AlphaBlend);
    s.drain_signals();

    let flags = StateChangedFlags::RESTORED_ERROR.union(StateChangedFlags::RECOVERABLE_ERROR);
    assert!(s.on_event_polled(&RuntimeEvent::PassthroughStateChanged(flags)));
    assert_eq!(
        s.drain_signals(),
        vec![
            PassthroughSignal::StateChanged(PassthroughStateEvent::RecoverableError),
            PassthroughSignal::StateChanged(PassthroughStateEvent::Restored),
        ]
    );
    assert_eq!(
        s.current_passthrough_layer(),
        Some(LayerPurpose::Reconstruction)
    );
    assert!(!s.on_event_polled(&RuntimeEvent::Other));
}
