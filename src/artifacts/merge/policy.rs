use crate::artifacts::objects::digest::Digest;
use std::sync::LazyLock;

static EMPTY_CONTENT: LazyLock<Digest> = LazyLock::new(|| Digest::of(b""));

/// Which side a merged path takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    Ours,
    Theirs,
    /// Both sides changed, the user decides
    Ask,
}

/// Decide a path from the digests of each side (`None` when absent)
///
/// Rules, first match wins:
/// 1. both sides agree: ours
/// 2. exactly one side changed since the ancestor: the changed side
/// 3. one side absent or empty, the other not: the non-empty side
/// 4. otherwise ask
pub fn decide(
    ancestor: Option<&Digest>,
    ours: Option<&Digest>,
    theirs: Option<&Digest>,
) -> MergeDecision {
    if ours == theirs {
        return MergeDecision::Ours;
    }

    if ours == ancestor {
        return MergeDecision::Theirs;
    }
    if theirs == ancestor {
        return MergeDecision::Ours;
    }

    match (is_blank(ours), is_blank(theirs)) {
        (true, false) => MergeDecision::Theirs,
        (false, true) => MergeDecision::Ours,
        _ => MergeDecision::Ask,
    }
}

fn is_blank(side: Option<&Digest>) -> bool {
    side.is_none_or(|digest| *digest == *EMPTY_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(content: &str) -> Digest {
        Digest::of(content)
    }

    #[test]
    fn identical_sides_keep_ours() {
        assert_eq!(
            decide(Some(&d("base")), Some(&d("x")), Some(&d("x"))),
            MergeDecision::Ours
        );
    }

    #[test]
    fn the_changed_side_wins() {
        let base = d("base");

        assert_eq!(
            decide(Some(&base), Some(&base), Some(&d("theirs"))),
            MergeDecision::Theirs
        );
        assert_eq!(
            decide(Some(&base), Some(&d("ours")), Some(&base)),
            MergeDecision::Ours
        );
        // added only on their side
        assert_eq!(decide(None, None, Some(&d("new"))), MergeDecision::Theirs);
        // deleted on their side, untouched on ours
        assert_eq!(decide(Some(&base), Some(&base), None), MergeDecision::Theirs);
    }

    #[test]
    fn non_empty_content_beats_empty_or_absent() {
        let empty = d("");

        assert_eq!(
            decide(Some(&d("base")), Some(&empty), Some(&d("theirs"))),
            MergeDecision::Theirs
        );
        assert_eq!(
            decide(Some(&d("base")), Some(&d("ours")), None),
            MergeDecision::Ours
        );
    }

    #[test]
    fn conflicting_changes_ask() {
        assert_eq!(
            decide(Some(&d("base")), Some(&d("ours")), Some(&d("theirs"))),
            MergeDecision::Ask
        );
        assert_eq!(
            decide(None, Some(&d("ours")), Some(&d("theirs"))),
            MergeDecision::Ask
        );
    }
}
