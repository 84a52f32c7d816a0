use crate::position::{position_key, Position, PositionStore};

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    /// `offset` is element top-left minus pointer at press time.
    Dragging { offset: (f32, f32) },
}

/// Pointer-drag behavior for one floating element.
///
/// Placement is restored from the position store on attach and written back
/// when a drag ends. Only one pointer is tracked; a new press replaces the
/// current drag.
#[derive(Debug, Clone)]
pub struct Draggable {
    storage_key: String,
    position: Position,
    state: DragState,
}

impl Draggable {
    pub fn attach(widget_id: &str, store: &PositionStore, default: Position) -> Self {
        let storage_key = position_key(widget_id);
        let position = store.load(&storage_key, default);
        Self {
            storage_key,
            position,
            state: DragState::Idle,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    pub fn pointer_down(&mut self, pointer: Position) {
        self.state = DragState::Dragging {
            offset: (self.position.x - pointer.x, self.position.y - pointer.y),
        };
    }

    /// Follow the pointer. Returns true if the element moved.
    pub fn pointer_move(&mut self, pointer: Position) -> bool {
        let DragState::Dragging { offset } = self.state else {
            return false;
        };
        let next = Position::new(pointer.x + offset.0, pointer.y + offset.1);
        if next == self.position {
            return false;
        }
        self.position = next;
        true
    }

    /// End the drag and persist the final position. A release without a
    /// matching press does nothing. Returns true if a drag ended.
    pub fn pointer_up(&mut self, store: &PositionStore) -> bool {
        if !self.is_dragging() {
            return false;
        }
        self.state = DragState::Idle;
        if let Err(e) = store.save(&self.storage_key, self.position) {
            app_warn!("[drag] could not save {}: {}", self.storage_key, e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{LocalStorage, MemoryLocalStorage};
    use std::sync::Arc;

    fn store() -> (Arc<MemoryLocalStorage>, PositionStore) {
        let storage = Arc::new(MemoryLocalStorage::default());
        (storage.clone(), PositionStore::new(storage))
    }

    #[test]
    fn attach_uses_default_without_saved_position() {
        let (_, store) = store();
        let d = Draggable::attach("mood-manager-ball", &store, Position::new(1180.0, 100.0));
        assert_eq!(d.position(), Position::new(1180.0, 100.0));
        assert_eq!(d.storage_key(), "mood-manager-ball-position");
        assert!(!d.is_dragging());
    }

    #[test]
    fn attach_restores_saved_position() {
        let (_, store) = store();
        store
            .save("mood-manager-panel-position", Position::new(20.0, 30.0))
            .unwrap();
        let d = Draggable::attach("mood-manager-panel", &store, Position::new(0.0, 0.0));
        assert_eq!(d.position(), Position::new(20.0, 30.0));
    }

    #[test]
    fn drag_and_release_persists_final_position() {
        let (_, store) = store();
        let mut d = Draggable::attach("ball", &store, Position::new(100.0, 100.0));

        d.pointer_down(Position::new(112.0, 108.0));
        assert!(d.pointer_move(Position::new(140.0, 100.0)));
        assert!(d.pointer_move(Position::new(162.0, 88.0)));
        assert_eq!(d.position(), Position::new(150.0, 80.0));

        assert!(d.pointer_up(&store));
        assert!(!d.is_dragging());
        assert_eq!(
            store.load("ball-position", Position::new(0.0, 0.0)),
            Position::new(150.0, 80.0)
        );

        let reattached = Draggable::attach("ball", &store, Position::new(0.0, 0.0));
        assert_eq!(reattached.position(), Position::new(150.0, 80.0));
    }

    #[test]
    fn release_without_press_is_noop() {
        let (storage, store) = store();
        let mut d = Draggable::attach("ball", &store, Position::new(5.0, 5.0));
        assert!(!d.pointer_up(&store));
        assert!(storage.get_item("ball-position").is_none());
    }

    #[test]
    fn move_while_idle_is_ignored() {
        let (_, store) = store();
        let mut d = Draggable::attach("ball", &store, Position::new(5.0, 5.0));
        assert!(!d.pointer_move(Position::new(300.0, 300.0)));
        assert_eq!(d.position(), Position::new(5.0, 5.0));
    }

    #[test]
    fn second_press_recaptures_offset() {
        let (_, store) = store();
        let mut d = Draggable::attach("ball", &store, Position::new(100.0, 100.0));
        d.pointer_down(Position::new(100.0, 100.0));
        d.pointer_move(Position::new(120.0, 100.0));
        // New press mid-drag at a different grip point.
        d.pointer_down(Position::new(130.0, 110.0));
        d.pointer_move(Position::new(140.0, 110.0));
        assert_eq!(d.position(), Position::new(130.0, 100.0));
    }

    #[test]
    fn failed_save_does_not_break_drag() {
        struct Full;
        impl LocalStorage for Full {
            fn get_item(&self, _key: &str) -> Option<String> {
                None
            }
            fn set_item(&self, _key: &str, _value: &str) -> Result<(), String> {
                Err("disk full".into())
            }
        }
        let store = PositionStore::new(Arc::new(Full));
        let mut d = Draggable::attach("ball", &store, Position::new(0.0, 0.0));
        d.pointer_down(Position::new(0.0, 0.0));
        d.pointer_move(Position::new(10.0, 10.0));
        assert!(d.pointer_up(&store));
        assert_eq!(d.position(), Position::new(10.0, 10.0));
        assert!(!d.is_dragging());
    }
}
