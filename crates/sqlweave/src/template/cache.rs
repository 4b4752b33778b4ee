use super::Template;
use crate::error::WeaveResult;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

type TemplateMap = HashMap<String, Arc<Template>>;

fn cache() -> &'static RwLock<TemplateMap> {
    static CACHE: OnceLock<RwLock<TemplateMap>> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

pub(super) fn preparse(source: &str) -> WeaveResult<Arc<Template>> {
    // Fast path: already cached.
    if let Some(cached) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(source)
    {
        return Ok(Arc::clone(cached));
    }

    // Parse without holding the lock. Two threads missing on the same source
    // both parse it; parsing is deterministic so either result is fine to keep.
    let parsed = Arc::new(Template::parse(source)?);

    #[cfg(feature = "tracing")]
    tracing::debug!(
        target: "sqlweave.template",
        source_len = source.len(),
        pieces = parsed.pieces().len(),
        has_params = parsed.has_params(),
        "template cache miss"
    );

    cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(source.to_string(), Arc::clone(&parsed));
    Ok(parsed)
}

/// Number of distinct sources currently cached.
pub fn cache_len() -> usize {
    cache().read().unwrap_or_else(PoisonError::into_inner).len()
}

/// Drop every cached template.
pub fn clear_cache() {
    cache()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}
