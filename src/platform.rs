use tokio::sync::mpsc;

/// Toast collaborator. Fire-and-forget; implementations must not block.
pub trait Notifier {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// Routing collaborator, invoked when a bet entry is activated.
pub trait Navigator {
    fn go_to(&self, path: &str);
}

/// Full view reload primitive. Terminal action of the reconciliation
/// machine; the current session does not survive it.
pub trait Reloader {
    fn reload(&self);
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Debug)]
pub enum PlatformEvent {
    Toast { kind: ToastKind, message: String },
    Navigate { path: String },
    Reload,
}

/// Channel-backed implementation of all three collaborators, drained by the
/// UI event loop.
#[derive(Clone)]
pub struct UiPlatform {
    tx: mpsc::UnboundedSender<PlatformEvent>,
}

impl UiPlatform {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PlatformEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: PlatformEvent) {
        // receiver gone means the loop is shutting down
        let _ = self.tx.send(event);
    }
}

impl Notifier for UiPlatform {
    fn success(&self, message: &str) {
        self.send(PlatformEvent::Toast {
            kind: ToastKind::Success,
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.send(PlatformEvent::Toast {
            kind: ToastKind::Error,
            message: message.to_string(),
        });
    }
}

impl Navigator for UiPlatform {
    fn go_to(&self, path: &str) {
        self.send(PlatformEvent::Navigate {
            path: path.to_string(),
        });
    }
}

impl Reloader for UiPlatform {
    fn reload(&self) {
        self.send(PlatformEvent::Reload);
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[tokio::test]
    async fn ui_platform__forwards_collaborator_calls_as_events() {
        // given
        let (platform, mut events) = UiPlatform::channel();

        // when
        platform.success("All clear");
        platform.error("nope");
        platform.go_to("/bet/1");
        platform.reload();

        // then
        assert!(matches!(
            events.recv().await,
            Some(PlatformEvent::Toast { kind: ToastKind::Success, message }) if message == "All clear"
        ));
        assert!(matches!(
            events.recv().await,
            Some(PlatformEvent::Toast { kind: ToastKind::Error, message }) if message == "nope"
        ));
        assert!(matches!(
            events.recv().await,
            Some(PlatformEvent::Navigate { path }) if path == "/bet/1"
        ));
        assert!(matches!(events.recv().await, Some(PlatformEvent::Reload)));
    }
}
