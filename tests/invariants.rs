//! Property tests for markup, countdown and deferral invariants

use std::time::Duration;

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use deploy_dialogs::countdown::{format_remaining, remaining_after};
use deploy_dialogs::deferral::DeferralPolicy;
use deploy_dialogs::markup::{MarkupRenderer, StyleFlag};
use deploy_dialogs::DialogOutcome;

fn flag() -> impl Strategy<Value = StyleFlag> {
    prop_oneof![
        Just(StyleFlag::Bold),
        Just(StyleFlag::Italic),
        Just(StyleFlag::Accent),
    ]
}

fn tag(flag: StyleFlag) -> &'static str {
    match flag {
        StyleFlag::Bold => "bold",
        StyleFlag::Italic => "italic",
        StyleFlag::Accent => "accent",
    }
}

proptest! {
    #[test]
    fn markup_never_panics(message in "\\PC{0,80}") {
        let _ = MarkupRenderer::render(&message);
    }

    #[test]
    fn text_without_tags_is_one_plain_run(message in "[a-zA-Z0-9 ,.!]{1,60}") {
        prop_assume!(!message.trim().is_empty());
        let runs = MarkupRenderer::render(&message);
        prop_assert_eq!(runs.len(), 1);
        prop_assert_eq!(runs[0].text(), message.as_str());
        prop_assert!(runs[0].style().is_plain());
    }

    #[test]
    fn nested_tags_accumulate(
        flags in prop::collection::vec(flag(), 1..6),
        body in "[a-z]{1,12}",
    ) {
        let open: String = flags.iter().map(|f| format!("[{}]", tag(*f))).collect();
        let close: String = flags.iter().rev().map(|f| format!("[/{}]", tag(*f))).collect();
        let message = format!("{open}{body}{close} tail");

        let runs = MarkupRenderer::render(&message);
        prop_assert_eq!(runs.len(), 2);
        prop_assert_eq!(runs[0].text(), body.as_str());
        for f in &flags {
            prop_assert!(runs[0].style().has(*f));
        }
        // Balanced tags leave nothing open
        prop_assert!(runs[1].style().is_plain());
    }

    #[test]
    fn invalid_link_targets_degrade_to_text(label in "[a-z]{1,10}", target in "[a-z]{1,10}") {
        let message = format!("[link={target}]{label}[/link]");
        let runs = MarkupRenderer::render(&message);
        prop_assert_eq!(runs.len(), 1);
        prop_assert!(!runs[0].is_link());
        prop_assert_eq!(runs[0].text(), label.as_str());
    }

    #[test]
    fn remaining_never_increases(total in 0u64..100_000, a in 0u64..200_000, b in 0u64..200_000) {
        let total = Duration::from_secs(total);
        let (early, late) = (a.min(b), a.max(b));
        let first = remaining_after(total, Duration::from_secs(early));
        let second = remaining_after(total, Duration::from_secs(late));
        prop_assert!(second <= first);
        prop_assert!(first <= total);
    }

    #[test]
    fn formatted_remaining_round_trips(secs in 0u64..360_000) {
        let text = format_remaining(Duration::from_secs(secs));
        let parts: Vec<u64> = text.split(':').map(|p| p.parse().unwrap()).collect();
        prop_assert_eq!(parts.len(), 3);
        prop_assert!(parts[1] < 60 && parts[2] < 60);
        prop_assert_eq!(parts[0] * 3600 + parts[1] * 60 + parts[2], secs);
    }

    #[test]
    fn defer_enablement(
        count in prop::option::of(0u32..5),
        deadline_offset in prop::option::of(-3600i64..3600),
        forced in any::<bool>(),
    ) {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let deadline = deadline_offset.map(|s| now + chrono::Duration::seconds(s));
        let policy = DeferralPolicy::new(count, deadline, forced);

        let configured = count.is_some() || deadline.is_some();
        let available = count.is_some_and(|c| c > 0) || deadline.is_some_and(|d| d > now);
        prop_assert_eq!(policy.defer_enabled(now), !configured || available);

        for blocking in [false, true] {
            let outcome = policy.resolve_countdown(blocking, now);
            if !forced || !available {
                prop_assert_ne!(&outcome, &DialogOutcome::Defer);
            }
            if !blocking {
                prop_assert_eq!(&outcome, &DialogOutcome::Continue);
            }
        }
    }
}
