use async_trait::async_trait;

/// Outbound alert channel.
///
/// `send` makes at most one delivery attempt and never fails the caller:
/// transport errors are logged by the implementation and reported as `false`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> bool;
}
