//! Cooperative cancellation. Every query receives one of these; executors
//! check it at stage boundaries and stop issuing new work once it fires.

use tokio_util::sync::CancellationToken;

#[derive(Clone, Default)]
pub struct Cancellation(CancellationToken);

impl Cancellation {
    pub fn new() -> Self {
        Cancellation(CancellationToken::new())
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    /// A child token tied to this one's lifetime: cancelling the parent
    /// cancels every child, but a child can never outlive cancellation of
    /// its parent.
    pub fn child(&self) -> Cancellation {
        Cancellation(self.0.child_token())
    }

    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_is_idempotent_and_visible_to_children() {
        let parent = Cancellation::new();
        let child = parent.child();
        assert!(!parent.is_cancelled());
        parent.cancel();
        parent.cancel();
        assert!(parent.is_cancelled());
        assert!(child.is_cancelled());
    }
}
