use safina::sync::{Receiver, SyncSender, sync_channel};

/// A connection slot.  Dropping the token puts it back in its set.
pub struct Token(SyncSender<()>);
impl Drop for Token {
    fn drop(&mut self) {
        let _ = self.0.try_send(());
    }
}

/// A fixed number of tokens.  Taking a token waits until one is free.
///
/// The event loop holds one token per open connection, so at most `size`
/// connections are served at once.
pub struct TokenSet(SyncSender<()>, Receiver<()>);
impl TokenSet {
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = sync_channel(size);
        for _ in 0..size {
            let _ = sender.try_send(());
        }
        Self(sender, receiver)
    }

    /// Waits for a free token.
    /// Returns `None` if the set was torn down.
    pub async fn async_wait_token(&mut self) -> Option<Token> {
        self.1.async_recv().await.ok()?;
        Some(Token(self.0.clone()))
    }
}
