//! Confirmation port — ask the user before destructive actions.

use std::future::Future;

pub trait Confirmation {
    /// Show `prompt` and resolve to `true` only if the user agreed.
    fn confirm(&self, prompt: &str) -> impl Future<Output = bool> + Send;
}
