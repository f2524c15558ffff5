//! Event dispatch by subsystem group.
//!
//! Each dispatchable group owns at most one callback. The reader thread looks
//! the group up for every inbound frame and calls the callback inline, so a
//! slow callback delays every frame behind it.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::{HciError, Result};
use crate::group::Group;

/// Callback receiving `(command, payload)` for every frame of its group.
///
/// The payload length is `payload.len()`.
pub type EventCallback = Arc<dyn Fn(u16, &[u8]) + Send + Sync>;

/// Registration state of a group.
#[derive(Clone, Default)]
pub enum Slot {
    /// No callback; frames for the group are dropped.
    #[default]
    Unregistered,
    /// Frames for the group go to this callback.
    Registered(EventCallback),
}

impl std::fmt::Debug for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Unregistered => write!(f, "Unregistered"),
            Slot::Registered(_) => write!(f, "Registered"),
        }
    }
}

/// What happened to a dispatched frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A callback received the frame.
    Delivered(Group),
    /// No callback for the frame's group; the frame was dropped.
    Unhandled(u8),
}

/// Counters kept by the router and the reader thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    /// Frames delivered to a callback.
    pub delivered: u64,
    /// Complete frames whose group had no callback.
    pub unhandled: u64,
    /// Frames abandoned while reading (short read, empty or oversized payload).
    pub dropped: u64,
}

/// Table mapping each group to its callback.
#[derive(Default)]
pub struct Router {
    slots: RwLock<HashMap<Group, Slot>>,
    delivered: AtomicU64,
    unhandled: AtomicU64,
    dropped: AtomicU64,
}

impl Router {
    /// Create a router with every group unregistered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `group_code`, replacing any previous callback.
    ///
    /// Codes outside the known groups, and the reserved MISC group, are rejected.
    pub fn set_event_callback<F>(&self, group_code: u8, callback: F) -> Result<()>
    where
        F: Fn(u16, &[u8]) + Send + Sync + 'static,
    {
        let group = Self::dispatchable(group_code)?;
        let previous = self
            .slots
            .write()
            .insert(group, Slot::Registered(Arc::new(callback)));
        if matches!(previous, Some(Slot::Registered(_))) {
            debug!(%group, "replacing event callback");
        }
        Ok(())
    }

    /// Remove the callback for `group_code`.
    pub fn clear_event_callback(&self, group_code: u8) -> Result<()> {
        let group = Self::dispatchable(group_code)?;
        self.slots.write().remove(&group);
        Ok(())
    }

    /// Remove every callback.
    pub fn clear_all(&self) {
        self.slots.write().clear();
    }

    /// Registration state of `group`.
    pub fn slot(&self, group: Group) -> Slot {
        self.slots.read().get(&group).cloned().unwrap_or_default()
    }

    /// Whether `group` has a callback.
    pub fn is_registered(&self, group: Group) -> bool {
        matches!(self.slot(group), Slot::Registered(_))
    }

    /// Route a frame to its group's callback.
    ///
    /// The callback runs on the calling thread, outside the table lock, so it
    /// may register or clear callbacks itself.
    pub fn dispatch(&self, command: u16, payload: &[u8]) -> Dispatch {
        let group_code = Group::code_of(command);
        let callback = Group::try_from(group_code)
            .ok()
            .filter(|group| group.is_dispatchable())
            .and_then(|group| match self.slot(group) {
                Slot::Registered(callback) => Some((group, callback)),
                Slot::Unregistered => None,
            });

        match callback {
            Some((group, callback)) => {
                callback(command, payload);
                self.delivered.fetch_add(1, Ordering::Relaxed);
                Dispatch::Delivered(group)
            }
            None => {
                info!(
                    command = format_args!("0x{:04X}", command),
                    len = payload.len(),
                    "no handler for group 0x{:02X}, dropping frame",
                    group_code
                );
                self.unhandled.fetch_add(1, Ordering::Relaxed);
                Dispatch::Unhandled(group_code)
            }
        }
    }

    /// Count a frame abandoned before it could be dispatched.
    pub fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the dispatch counters.
    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    fn dispatchable(group_code: u8) -> Result<Group> {
        match Group::try_from(group_code) {
            Ok(group) if group.is_dispatchable() => Ok(group),
            _ => Err(HciError::UnregisteredGroup(group_code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<(u16, Vec<u8>)>>>, impl Fn(u16, &[u8]) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |command: u16, payload: &[u8]| {
            sink.lock().push((command, payload.to_vec()))
        })
    }

    #[test]
    fn test_mesh_frame_reaches_mesh_callback() {
        let router = Router::new();
        let (seen, callback) = recorder();
        router.set_event_callback(GROUP_MESH, callback).unwrap();

        assert_eq!(router.dispatch(0x16F1, &[3, 0, 0]), Dispatch::Delivered(Group::Mesh));
        assert_eq!(*seen.lock(), vec![(0x16F1, vec![3, 0, 0])]);
    }

    #[test]
    fn test_unregistered_group_is_dropped() {
        let router = Router::new();
        let (seen, callback) = recorder();
        router.set_event_callback(GROUP_MESH, callback).unwrap();

        assert_eq!(
            router.dispatch(EVT_LE_CONNECTED, &[1]),
            Dispatch::Unhandled(GROUP_LE)
        );
        assert_eq!(
            router.dispatch(EVT_MISC_VERSION, &[]),
            Dispatch::Unhandled(GROUP_MISC)
        );
        assert_eq!(router.dispatch(0x4201, &[]), Dispatch::Unhandled(0x42));
        assert!(seen.lock().is_empty());
        assert_eq!(router.stats().unhandled, 3);
    }

    #[test]
    fn test_second_registration_replaces_first() {
        let router = Router::new();
        let (first, callback) = recorder();
        router.set_event_callback(GROUP_GATT, callback).unwrap();
        let (second, callback) = recorder();
        router.set_event_callback(GROUP_GATT, callback).unwrap();

        router.dispatch(EVT_GATT_NOTIFICATION, &[7]);
        assert!(first.lock().is_empty());
        assert_eq!(second.lock().len(), 1);
    }

    #[test]
    fn test_registration_rejects_unknown_and_misc() {
        let router = Router::new();
        assert!(matches!(
            router.set_event_callback(0x03, |_, _| {}),
            Err(HciError::UnregisteredGroup(0x03))
        ));
        assert!(matches!(
            router.set_event_callback(GROUP_MISC, |_, _| {}),
            Err(HciError::UnregisteredGroup(GROUP_MISC))
        ));
    }

    #[test]
    fn test_clear_callback() {
        let router = Router::new();
        router.set_event_callback(GROUP_DEVICE, |_, _| {}).unwrap();
        assert!(router.is_registered(Group::Device));

        router.clear_event_callback(GROUP_DEVICE).unwrap();
        assert!(!router.is_registered(Group::Device));
        assert!(matches!(router.slot(Group::Device), Slot::Unregistered));
    }

    #[test]
    fn test_callback_may_reregister_from_inside_dispatch() {
        let router = Arc::new(Router::new());
        let inner = router.clone();
        router
            .set_event_callback(GROUP_LE, move |_, _| {
                inner.clear_event_callback(GROUP_LE).unwrap();
            })
            .unwrap();

        router.dispatch(EVT_LE_SCAN_STATUS, &[0]);
        assert!(!router.is_registered(Group::Le));
    }
}
