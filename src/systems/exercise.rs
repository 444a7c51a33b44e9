use bevy_ecs::prelude::*;
use log::debug;

use crate::exercise::Exercise;
use crate::resources::hostbridge::HostBridge;

/// Forward queued exercise calls to the host, in the order they were made.
pub fn deliver_host_calls(
    mut exercises: Query<&mut Exercise>,
    mut bridge: Option<NonSendMut<HostBridge>>,
) {
    for mut exercise in exercises.iter_mut() {
        if !exercise.has_outbox() {
            continue;
        }
        let calls = exercise.take_outbox();
        match bridge.as_mut() {
            Some(bridge) => {
                for call in &calls {
                    bridge.host_mut().deliver(call);
                }
            }
            None => debug!("no exercise host attached, dropping {} calls", calls.len()),
        }
    }
}
