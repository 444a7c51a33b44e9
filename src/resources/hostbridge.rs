use crate::exercise::ExerciseHost;

/// NonSend resource holding the host exercise reports go to.
///
/// Without a bridge in the world, queued host calls are dropped.
pub struct HostBridge {
    host: Box<dyn ExerciseHost>,
}

impl HostBridge {
    pub fn new(host: impl ExerciseHost + 'static) -> Self {
        Self {
            host: Box::new(host),
        }
    }

    pub fn host_mut(&mut self) -> &mut dyn ExerciseHost {
        self.host.as_mut()
    }
}
