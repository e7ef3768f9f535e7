//! Per-post engagement state for one viewing actor.
//!
//! Each rendered post owns one [`EngagementCoordinator`]. It mirrors the like,
//! share and comment state of that post locally, applies every mutation to the
//! document store, and keeps duplicate like/share submissions out with a
//! [`CooldownGate`].
//!
//! Behavior worth knowing before touching this file:
//!
//! - Like and share write the relation row and the counter delta as two
//!   sequential calls. A failure between them leaves the store out of sync;
//!   nothing compensates.
//! - Local like/share state changes only after both calls succeed. Comments are
//!   prepended before the store call and stay in the list if it fails.
//! - Optimistic comments keep their `temp-` id for the life of the view.
//! - Mutations are ignored until the first `initialize` settles. A later
//!   `initialize` that overlaps a mutation leaves local state alone.
//! - Failures of every kind surface as the same notice.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::cooldown::CooldownGate;
use super::notices::{Action, NoticeBoard};
use crate::clock::{Clock, IdSource, SystemClock, UuidIdSource};
use crate::config::EngagementConfig;
use crate::domain::{Comment, EngagementCounts};
use crate::error::{EngagementError, EngagementResult, StoreError, StoreResult};
use crate::metrics;
use crate::repository::{CommentRepository, LikeRepository, PostRepository, ShareRepository};
use crate::store::{DocumentStore, TimeoutStore};

/// Displayed engagement state of one post for one actor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementState {
    pub liked: bool,
    pub shared: bool,
    pub counts: EngagementCounts,
    pub comments_visible: bool,
    /// Newest first
    pub comments: Vec<Comment>,
    pub comment_draft: String,
    /// A like/share call is pending or cooling down
    pub action_in_flight: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    CoolingDown,
    AlreadyShared,
    EmptyComment,
    Detached,
    /// The first `initialize` has not settled yet
    Initializing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Store call succeeded and local state was updated
    Applied,
    /// Nothing was sent to the store
    Ignored(IgnoreReason),
    /// Detached, or superseded by a local mutation, while the call was
    /// pending; local state untouched
    Stale,
}

impl ActionOutcome {
    fn label(&self) -> &'static str {
        match self {
            ActionOutcome::Applied => "applied",
            ActionOutcome::Ignored(_) => "ignored",
            ActionOutcome::Stale => "stale",
        }
    }
}

/// Collaborators shared by every coordinator in a view
#[derive(Clone)]
pub struct EngagementContext {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    notices: NoticeBoard,
    cooldown: Duration,
}

impl EngagementContext {
    pub fn new(store: Arc<dyn DocumentStore>, config: &EngagementConfig) -> Self {
        let store: Arc<dyn DocumentStore> = match config.store_timeout() {
            Some(limit) => Arc::new(TimeoutStore::new(store, limit)),
            None => store,
        };

        Self {
            store,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdSource),
            notices: NoticeBoard::new(config.notice_capacity),
            cooldown: config.cooldown(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_id_source(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    /// Coordinator for `post_id` as seen by `actor_id`. Call
    /// [`EngagementCoordinator::initialize`] before use.
    pub fn coordinator(&self, post_id: Uuid, actor_id: Uuid) -> EngagementCoordinator {
        EngagementCoordinator {
            post_id,
            actor_id,
            posts: PostRepository::new(self.store.clone()),
            likes: LikeRepository::new(self.store.clone()),
            shares: ShareRepository::new(self.store.clone()),
            comments: CommentRepository::new(self.store.clone()),
            clock: self.clock.clone(),
            ids: self.ids.clone(),
            notices: self.notices.clone(),
            inner: Mutex::new(Inner {
                view: EngagementState::default(),
                gate: CooldownGate::new(self.cooldown),
                generation: 0,
                detached: false,
                ready: false,
                mutations: 0,
                pending_mutations: 0,
            }),
        }
    }
}

struct Inner {
    view: EngagementState,
    gate: CooldownGate,
    generation: u64,
    detached: bool,
    /// An initialize has settled
    ready: bool,
    /// Bumped each time a like/share/comment starts
    mutations: u64,
    pending_mutations: u32,
}

impl Inner {
    fn claim_mutation(&mut self) {
        self.mutations += 1;
        self.pending_mutations += 1;
    }

    fn release_mutation(&mut self) {
        self.pending_mutations = self.pending_mutations.saturating_sub(1);
    }
}

pub struct EngagementCoordinator {
    post_id: Uuid,
    actor_id: Uuid,
    posts: PostRepository,
    likes: LikeRepository,
    shares: ShareRepository,
    comments: CommentRepository,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdSource>,
    notices: NoticeBoard,
    inner: Mutex<Inner>,
}

impl EngagementCoordinator {
    pub fn snapshot(&self) -> EngagementState {
        let inner = self.inner.lock();
        let mut view = inner.view.clone();
        view.action_in_flight = inner.gate.is_closed();
        view
    }

    /// Load counters and the actor's like/share marks with three concurrent
    /// reads. On failure `liked` and `shared` stay false; there is no retry.
    ///
    /// Reads that overlap a local mutation may or may not include its write,
    /// so such a result is dropped and reported as [`ActionOutcome::Stale`].
    #[instrument(skip(self), fields(post_id = %self.post_id, actor_id = %self.actor_id))]
    pub async fn initialize(&self) -> EngagementResult<ActionOutcome> {
        let (generation, baseline) = {
            let inner = self.inner.lock();
            if inner.detached {
                drop(inner);
                return Ok(self.finish(
                    Action::Initialize,
                    ActionOutcome::Ignored(IgnoreReason::Detached),
                ));
            }
            let baseline = (inner.pending_mutations == 0).then_some(inner.mutations);
            (inner.generation, baseline)
        };

        let (post, liked, shared) = tokio::join!(
            self.posts.get_engagement(self.post_id),
            self.likes.check_user_liked(self.post_id, self.actor_id),
            self.shares.check_user_shared(self.post_id, self.actor_id),
        );

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            drop(inner);
            return Ok(self.finish(Action::Initialize, ActionOutcome::Stale));
        }

        inner.ready = true;
        if baseline != Some(inner.mutations) || inner.pending_mutations > 0 {
            drop(inner);
            debug!(
                post_id = %self.post_id,
                "local mutation overlapped initialize; keeping local state"
            );
            return Ok(self.finish(Action::Initialize, ActionOutcome::Stale));
        }

        match &post {
            Ok(Some(engagement)) => inner.view.counts = (*engagement).into(),
            Ok(None) => {
                warn!(post_id = %self.post_id, "post document missing; showing zero counters");
                inner.view.counts = EngagementCounts::default();
            }
            Err(_) => {}
        }

        match (post, liked, shared) {
            (Ok(_), Ok(liked), Ok(shared)) => {
                inner.view.liked = liked;
                inner.view.shared = shared;
                drop(inner);
                Ok(self.finish(Action::Initialize, ActionOutcome::Applied))
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                inner.view.liked = false;
                inner.view.shared = false;
                drop(inner);
                Err(self.fail(Action::Initialize, e))
            }
        }
    }

    /// Like if not liked, unlike if liked. Ignored while the gate is closed.
    #[instrument(skip(self), fields(post_id = %self.post_id, actor_id = %self.actor_id))]
    pub async fn toggle_like(&self) -> EngagementResult<ActionOutcome> {
        let (generation, was_liked) = {
            let mut inner = self.inner.lock();
            if let Some(outcome) = Self::gate_closed(&mut inner) {
                drop(inner);
                return Ok(self.finish(Action::Like, outcome));
            }
            inner.claim_mutation();
            (inner.generation, inner.view.liked)
        };

        let result = self.write_like(!was_liked).await;

        let mut inner = self.inner.lock();
        inner.gate.settle();
        inner.release_mutation();
        if inner.generation != generation {
            drop(inner);
            return Ok(self.finish(Action::Like, ActionOutcome::Stale));
        }

        match result {
            Ok(delta) => {
                inner.view.liked = !was_liked;
                inner.view.counts.likes = (inner.view.counts.likes + delta).max(0);
                drop(inner);
                Ok(self.finish(Action::Like, ActionOutcome::Applied))
            }
            Err(e) => {
                drop(inner);
                Err(self.fail(Action::Like, e))
            }
        }
    }

    /// Relation row first, then the counter. Returns the delta applied to
    /// `likeCount`, which is zero when the row was already in the wanted state.
    async fn write_like(&self, like: bool) -> StoreResult<i64> {
        if like {
            if !self.likes.create_like(self.post_id, self.actor_id).await? {
                debug!(post_id = %self.post_id, "like already recorded");
                return Ok(0);
            }
            self.posts.increment_like_count(self.post_id).await?;
            Ok(1)
        } else {
            if !self.likes.delete_like(self.post_id, self.actor_id).await? {
                debug!(post_id = %self.post_id, "like already removed");
                return Ok(0);
            }
            self.posts.decrement_like_count(self.post_id).await?;
            Ok(-1)
        }
    }

    /// Record a share. Shares are permanent; once shared this is a no-op.
    #[instrument(skip(self), fields(post_id = %self.post_id, actor_id = %self.actor_id))]
    pub async fn toggle_share(&self) -> EngagementResult<ActionOutcome> {
        let generation = {
            let mut inner = self.inner.lock();
            if inner.view.shared {
                drop(inner);
                return Ok(self.finish(
                    Action::Share,
                    ActionOutcome::Ignored(IgnoreReason::AlreadyShared),
                ));
            }
            if let Some(outcome) = Self::gate_closed(&mut inner) {
                drop(inner);
                return Ok(self.finish(Action::Share, outcome));
            }
            inner.claim_mutation();
            inner.generation
        };

        let result = self.write_share().await;

        let mut inner = self.inner.lock();
        inner.gate.settle();
        inner.release_mutation();
        if inner.generation != generation {
            drop(inner);
            return Ok(self.finish(Action::Share, ActionOutcome::Stale));
        }

        match result {
            Ok(delta) => {
                inner.view.shared = true;
                inner.view.counts.shares += delta;
                drop(inner);
                Ok(self.finish(Action::Share, ActionOutcome::Applied))
            }
            Err(e) => {
                drop(inner);
                Err(self.fail(Action::Share, e))
            }
        }
    }

    async fn write_share(&self) -> StoreResult<i64> {
        if !self.shares.create_share(self.post_id, self.actor_id).await? {
            debug!(post_id = %self.post_id, "share already recorded");
            return Ok(0);
        }
        self.posts.increment_share_count(self.post_id).await?;
        Ok(1)
    }

    pub fn set_comment_draft(&self, text: impl Into<String>) {
        self.inner.lock().view.comment_draft = text.into();
    }

    /// Submit whatever is in the draft buffer. The draft is cleared on success
    /// unless it was edited while the call was pending.
    pub async fn submit_draft(&self) -> EngagementResult<ActionOutcome> {
        let draft = self.inner.lock().view.comment_draft.clone();
        self.submit_comment(&draft).await
    }

    /// Post a comment. Not subject to the like/share cooldown.
    ///
    /// The comment is shown immediately under a temporary id and stays shown
    /// even when the store rejects it.
    #[instrument(skip(self, text), fields(post_id = %self.post_id, actor_id = %self.actor_id))]
    pub async fn submit_comment(&self, text: &str) -> EngagementResult<ActionOutcome> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(self.finish(
                Action::Comment,
                ActionOutcome::Ignored(IgnoreReason::EmptyComment),
            ));
        }

        let optimistic = Comment {
            id: self.ids.temporary_id(),
            post_id: self.post_id,
            actor_id: self.actor_id,
            content: content.to_string(),
            created_at: self.clock.now(),
        };

        let generation = {
            let mut inner = self.inner.lock();
            if inner.detached {
                drop(inner);
                return Ok(self.finish(
                    Action::Comment,
                    ActionOutcome::Ignored(IgnoreReason::Detached),
                ));
            }
            if !inner.ready {
                drop(inner);
                return Ok(self.finish(
                    Action::Comment,
                    ActionOutcome::Ignored(IgnoreReason::Initializing),
                ));
            }
            inner.claim_mutation();
            inner.view.comments.insert(0, optimistic.clone());
            inner.view.counts.comments += 1;
            inner.generation
        };

        let result = self.write_comment(optimistic.content.clone()).await;

        let mut inner = self.inner.lock();
        inner.release_mutation();
        if inner.generation != generation {
            drop(inner);
            return Ok(self.finish(Action::Comment, ActionOutcome::Stale));
        }

        match result {
            Ok(stored_id) => {
                // Text typed while the call was pending stays in the draft
                if inner.view.comment_draft.trim() == optimistic.content {
                    inner.view.comment_draft.clear();
                }
                drop(inner);
                debug!(temp_id = %optimistic.id, %stored_id, "comment stored");
                Ok(self.finish(Action::Comment, ActionOutcome::Applied))
            }
            Err(e) => {
                drop(inner);
                Err(self.fail(Action::Comment, e))
            }
        }
    }

    async fn write_comment(&self, content: String) -> StoreResult<String> {
        let id = self
            .comments
            .create_comment(self.post_id, self.actor_id, content)
            .await?;
        self.posts.increment_comment_count(self.post_id).await?;
        Ok(id)
    }

    /// Replace the comment list with the store's, newest first. Does not
    /// subscribe to later changes.
    #[instrument(skip(self), fields(post_id = %self.post_id))]
    pub async fn load_comments(&self) -> EngagementResult<ActionOutcome> {
        let generation = match self.begin(Action::LoadComments) {
            Ok(generation) => generation,
            Err(outcome) => return Ok(outcome),
        };

        let result = self.comments.get_post_comments(self.post_id).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            drop(inner);
            return Ok(self.finish(Action::LoadComments, ActionOutcome::Stale));
        }

        match result {
            Ok(comments) => {
                inner.view.comments = comments;
                drop(inner);
                Ok(self.finish(Action::LoadComments, ActionOutcome::Applied))
            }
            Err(e) => {
                drop(inner);
                Err(self.fail(Action::LoadComments, e))
            }
        }
    }

    /// Show the comment panel and load its contents
    pub async fn open_comments(&self) -> EngagementResult<ActionOutcome> {
        self.inner.lock().view.comments_visible = true;
        self.load_comments().await
    }

    pub fn close_comments(&self) {
        self.inner.lock().view.comments_visible = false;
    }

    /// The view is gone. Pending calls still finish at the store but their
    /// results are not applied, and later actions are ignored.
    pub fn detach(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.detached = true;
        info!(post_id = %self.post_id, actor_id = %self.actor_id, "engagement view detached");
    }

    /// Generation for an ungated action, or the outcome when detached
    fn begin(&self, action: Action) -> Result<u64, ActionOutcome> {
        let inner = self.inner.lock();
        if inner.detached {
            drop(inner);
            return Err(self.finish(
                action,
                ActionOutcome::Ignored(IgnoreReason::Detached),
            ));
        }
        Ok(inner.generation)
    }

    /// Claims the gate, or says why not
    fn gate_closed(inner: &mut Inner) -> Option<ActionOutcome> {
        if inner.detached {
            return Some(ActionOutcome::Ignored(IgnoreReason::Detached));
        }
        if !inner.ready {
            return Some(ActionOutcome::Ignored(IgnoreReason::Initializing));
        }
        if !inner.gate.try_begin() {
            return Some(ActionOutcome::Ignored(IgnoreReason::CoolingDown));
        }
        None
    }

    fn finish(&self, action: Action, outcome: ActionOutcome) -> ActionOutcome {
        debug!(post_id = %self.post_id, %action, ?outcome, "engagement action finished");
        metrics::record_action(action.as_str(), outcome.label());
        outcome
    }

    fn fail(&self, action: Action, source: StoreError) -> EngagementError {
        warn!(
            post_id = %self.post_id,
            actor_id = %self.actor_id,
            %action,
            error = %source,
            "engagement action failed"
        );
        metrics::record_action(action.as_str(), "failed");
        self.notices.publish_failure(action, self.clock.now());
        EngagementError::action_failed(action, source)
    }
}
