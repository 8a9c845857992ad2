/// Returns the cached value for `$key`, or evaluates `$block`, queues the
/// result for caching with `$ttl` seconds and returns it.
///
/// A failed cache read is logged and treated as a miss. `$cache` must provide
/// `get_from_cache` and `set_in_background`; the macro evaluates to an
/// `AppResult` of the value.
///
/// # Example
/// ```rust,ignore
/// let ids: AppResult<Vec<ItemId>> = cached!(cache, key, ttl, async { compute_ids().await });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let hit = match $cache.get_from_cache(&$key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, key = %$key, "Cache read failed, recomputing");
                None
            }
        };
        match hit {
            Some(cached) => $crate::error::AppResult::Ok(cached),
            None => match $block.await {
                Ok(value) => {
                    $cache.set_in_background(&$key, &value, $ttl);
                    Ok(value)
                }
                Err(e) => Err(e),
            },
        }
    }};
}
