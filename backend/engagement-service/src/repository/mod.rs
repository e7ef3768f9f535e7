pub mod comments;
pub mod likes;
pub mod posts;
pub mod shares;

pub use comments::CommentRepository;
pub use likes::LikeRepository;
pub use posts::PostRepository;
pub use shares::ShareRepository;

use crate::error::StoreResult;
use crate::metrics;
use crate::store::Collection;

/// Count store failures per collection and operation before handing them on
fn observe<T>(
    collection: Collection,
    op: &'static str,
    result: StoreResult<T>,
) -> StoreResult<T> {
    if let Err(e) = &result {
        tracing::debug!(%collection, op, error = %e, "store call failed");
        metrics::record_store_error(collection.as_str(), op);
    }
    result
}
