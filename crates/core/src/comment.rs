//! Comment threading, visibility and mention rules.

use std::collections::HashSet;

use crate::policy::Actor;
use crate::types::{CommentId, Commentable, UserId};

/// Where a new comment lands and whether it is internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub commentable: Commentable,
    pub is_internal: bool,
}

/// Where a reply is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyTarget {
    /// The top-level comment the reply hangs off.
    pub root: CommentId,
    pub placement: Placement,
}

/// Attach a reply to `parent`, whose own parent is `parent_root`.
///
/// Threads are one level deep: replying to a reply attaches to its root.
/// The reply takes the parent's subject and internal flag whatever the
/// request asked for.
pub fn reply_target(
    parent: CommentId,
    parent_root: Option<CommentId>,
    parent_placement: Placement,
) -> ReplyTarget {
    ReplyTarget {
        root: parent_root.unwrap_or(parent),
        placement: parent_placement,
    }
}

/// Whether `actor` may see a comment with the given internal flag at all.
/// Ownership is checked separately by the policy.
pub fn visible_to(actor: &Actor, is_internal: bool) -> bool {
    !is_internal || actor.is_admin()
}

/// De-duplicate a mention list, keeping first-seen order.
pub fn normalize_mentions(mentions: &[UserId]) -> Vec<UserId> {
    let mut seen = HashSet::new();
    mentions.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Users to notify for a mention list: every mentioned user except the author.
pub fn mention_recipients(mentions: &[UserId], author: UserId) -> Vec<UserId> {
    normalize_mentions(mentions)
        .into_iter()
        .filter(|id| *id != author)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::types::DeliverableId;

    fn internal_on_deliverable() -> Placement {
        Placement {
            commentable: Commentable::Deliverable(DeliverableId::new()),
            is_internal: true,
        }
    }

    #[test]
    fn reply_to_top_level_attaches_to_it() {
        let parent = CommentId::new();
        let placement = internal_on_deliverable();
        let target = reply_target(parent, None, placement);
        assert_eq!(target.root, parent);
        assert_eq!(target.placement, placement);
    }

    #[test]
    fn reply_to_reply_flattens_to_root() {
        let root = CommentId::new();
        let placement = internal_on_deliverable();
        let target = reply_target(CommentId::new(), Some(root), placement);
        assert_eq!(target.root, root);
        assert!(target.placement.is_internal);
        assert_eq!(target.placement.commentable, placement.commentable);
    }

    #[test]
    fn internal_comments_hidden_from_clients() {
        let client = Actor::new(UserId::new(), Role::Client);
        let admin = Actor::new(UserId::new(), Role::Admin);
        assert!(!visible_to(&client, true));
        assert!(visible_to(&client, false));
        assert!(visible_to(&admin, true));
    }

    #[test]
    fn author_is_never_a_mention_recipient() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(mention_recipients(&[a, b], b), vec![a]);
    }

    #[test]
    fn duplicate_mentions_collapse() {
        let a = UserId::new();
        let b = UserId::new();
        assert_eq!(normalize_mentions(&[a, b, a]), vec![a, b]);
    }
}
