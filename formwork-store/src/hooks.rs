//! Save and finish-field hook registries.
//!
//! Field types register callbacks here (through the
//! [`FormInspector`](crate::FormInspector)) to take part in the submit
//! lifecycle without the form knowing about them. Registration happens
//! while the form is being rendered, which only holds shared references, so
//! the registries use interior mutability.

use formwork_types::DataPath;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::SaveOptions;

/// Runs before a submit. Returning `Err(message)` blocks the save, but
/// never prevents the remaining handlers from running.
pub trait SaveHandler {
    fn on_save(&self, options: &SaveOptions) -> Result<(), String>;
}

impl<F> SaveHandler for F
where
    F: Fn(&SaveOptions) -> Result<(), String>,
{
    fn on_save(&self, options: &SaveOptions) -> Result<(), String> {
        self(options)
    }
}

/// Runs after a field commits its value (blur / selection confirmed).
pub trait FinishFieldHandler {
    fn on_finish(&self, data_path: &DataPath);
}

impl<F> FinishFieldHandler for F
where
    F: Fn(&DataPath),
{
    fn on_finish(&self, data_path: &DataPath) {
        self(data_path)
    }
}

/// Handle returned on registration, used to remove a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
pub(crate) struct Hooks {
    next_id: Cell<u64>,
    save: RefCell<Vec<(HandlerId, Rc<dyn SaveHandler>)>>,
    finish: RefCell<Vec<(HandlerId, Rc<dyn FinishFieldHandler>)>>,
}

impl Hooks {
    fn next_id(&self) -> HandlerId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        HandlerId(id)
    }

    pub(crate) fn add_save(&self, handler: Rc<dyn SaveHandler>) -> HandlerId {
        let id = self.next_id();
        self.save.borrow_mut().push((id, handler));
        id
    }

    pub(crate) fn remove_save(&self, id: HandlerId) -> bool {
        let mut handlers = self.save.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub(crate) fn add_finish(&self, handler: Rc<dyn FinishFieldHandler>) -> HandlerId {
        let id = self.next_id();
        self.finish.borrow_mut().push((id, handler));
        id
    }

    pub(crate) fn remove_finish(&self, id: HandlerId) -> bool {
        let mut handlers = self.finish.borrow_mut();
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    /// Invokes every save handler in registration order and collects the
    /// failures. The list is snapshotted first so handlers may register or
    /// remove handlers while running.
    pub(crate) fn trigger_save(&self, options: &SaveOptions) -> Vec<String> {
        let handlers: Vec<_> = self.save.borrow().iter().map(|(_, h)| Rc::clone(h)).collect();
        handlers
            .iter()
            .filter_map(|handler| handler.on_save(options).err())
            .collect()
    }

    pub(crate) fn trigger_finish(&self, data_path: &DataPath) {
        let handlers: Vec<_> = self.finish.borrow().iter().map(|(_, h)| Rc::clone(h)).collect();
        for handler in handlers {
            handler.on_finish(data_path);
        }
    }

    pub(crate) fn clear(&self) {
        self.save.borrow_mut().clear();
        self.finish.borrow_mut().clear();
    }
}
