use crate::feed::types::Movie;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    /// No (more) results for the criteria.
    Empty,
    Error,
}

/// Receives render instructions from the feed controller.
pub trait Presenter {
    /// Drop everything displayed for the previous criteria.
    fn clear(&mut self);
    fn append(&mut self, items: &[Movie]);
    fn set_status_message(&mut self, text: &str, kind: StatusKind);
    /// Loading ended with nothing new to show; drop the loading notice.
    fn clear_status(&mut self);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn clear(&mut self) {
        (**self).clear()
    }

    fn append(&mut self, items: &[Movie]) {
        (**self).append(items)
    }

    fn set_status_message(&mut self, text: &str, kind: StatusKind) {
        (**self).set_status_message(text, kind)
    }

    fn clear_status(&mut self) {
        (**self).clear_status()
    }
}
