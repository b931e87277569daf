/// Gives the executor a chance to run other tasks before the caller continues.
///
/// Operations call this before starting heavy synchronous work, so that state changes reported just before it
/// can be observed (e.g. rendered) by the caller.
pub(crate) async fn yield_now() {
    tokio::task::yield_now().await;
}
