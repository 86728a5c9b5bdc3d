//! Member name resolution
//!
//! Resolves a lookup string against a type descriptor: structural member
//! names first (property, field, method, event, in that order), then
//! attribute aliases in a fixed order (display, serialized, column, table,
//! schema). Comparison is case-insensitive; when punctuation folding is on,
//! a second pass strips spaces, hyphens, underscores, and dots from both
//! sides, so `user_id`, `UserId`, and `User.Id` all land on the same member.
//!
//! A miss is an `Option`, never an error. Results (including misses) are
//! memoized per type descriptor unless a caller-supplied filter was in
//! play - filtered results depend on the filter, so they never enter the
//! memo.

use std::sync::Arc;

use bitflags::bitflags;
use tracing::trace;

use crate::config::{self, ResolverSection};
use crate::descriptor::{self, MemberDescriptor, MemberKind};

bitflags! {
    /// Which name domains a lookup may match against
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct NameKind: u8 {
        /// Structural member name
        const NAME       = 1 << 0;
        /// Display attribute
        const DISPLAY    = 1 << 1;
        /// Serialization name
        const SERIALIZED = 1 << 2;
        /// Storage column name
        const COLUMN     = 1 << 3;
        /// Storage table name of the member's related type
        const TABLE      = 1 << 4;
        /// Storage schema name of the member's related type
        const SCHEMA     = 1 << 5;
    }
}

impl NameKind {
    pub const ALIASES: NameKind = NameKind::DISPLAY
        .union(NameKind::SERIALIZED)
        .union(NameKind::COLUMN)
        .union(NameKind::TABLE)
        .union(NameKind::SCHEMA);
}

impl Default for NameKind {
    fn default() -> Self {
        NameKind::all()
    }
}

/// Optional member predicate; rejected candidates fall through to the next
/// resolution tier
pub type MemberFilter<'a> = &'a dyn Fn(&MemberDescriptor) -> bool;

/// Resolve a member of `td` by name or alias, memoizing the outcome
pub fn resolve(
    td: &Arc<MemberDescriptor>,
    lookup: &str,
    mask: NameKind,
    filter: Option<MemberFilter<'_>>,
) -> Option<Arc<MemberDescriptor>> {
    let lookup = lookup.trim();
    if lookup.is_empty() {
        return None;
    }

    let section = config::engine_config().resolver;
    if filter.is_some() {
        // Filtered outcomes are filter-dependent, keep them out of the memo
        return search(td, lookup, mask, filter, &section);
    }

    let key = format!("{:02x}:{}", mask.bits(), lookup.to_ascii_lowercase());
    if let Some(hit) = td.memoized(&key) {
        trace!(type_name = td.name(), lookup, "resolution memo hit");
        return hit;
    }

    let result = search(td, lookup, mask, None, &section);
    td.memoize(&key, result.clone());
    result
}

/// Resolve against an explicit resolver configuration, without memoization
pub fn resolve_with(
    td: &Arc<MemberDescriptor>,
    lookup: &str,
    mask: NameKind,
    filter: Option<MemberFilter<'_>>,
    section: &ResolverSection,
) -> Option<Arc<MemberDescriptor>> {
    let lookup = lookup.trim();
    if lookup.is_empty() {
        return None;
    }
    search(td, lookup, mask, filter, section)
}

/// Resolve a dotted member path, stepping through related type descriptors
pub fn resolve_path(
    td: &Arc<MemberDescriptor>,
    path: &str,
    mask: NameKind,
) -> Option<Vec<Arc<MemberDescriptor>>> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut current = td.clone();
    let mut chain = Vec::with_capacity(segments.len());
    for (i, segment) in segments.iter().enumerate() {
        let member = resolve(&current, segment, mask, None)?;
        let related = member.related_spec();
        chain.push(member);
        // A leaf is fine at the end; mid-path it means the path is bad
        if i + 1 < segments.len() {
            current = descriptor::of_type(related?).ok()?;
        }
    }
    Some(chain)
}

// ----------------------------------------------------------------------------
// Search internals
// ----------------------------------------------------------------------------

fn search(
    td: &Arc<MemberDescriptor>,
    lookup: &str,
    mask: NameKind,
    filter: Option<MemberFilter<'_>>,
    section: &ResolverSection,
) -> Option<Arc<MemberDescriptor>> {
    let fold = section.fold_punctuation;

    // Structural tiers, fixed order
    if mask.contains(NameKind::NAME) {
        const TIERS: [MemberKind; 4] = [
            MemberKind::Property,
            MemberKind::Field,
            MemberKind::Method,
            MemberKind::Event,
        ];
        for kind in TIERS {
            let found = tier_match(td, lookup, filter, fold, Tier::Structural(kind));
            if let Some(member) = found {
                trace!(type_name = td.name(), lookup, member = member.name(), "structural match");
                return Some(member);
            }
        }
    }

    // Alias tiers, fixed order
    if section.alias_fallback {
        const ALIAS_ORDER: [NameKind; 5] = [
            NameKind::DISPLAY,
            NameKind::SERIALIZED,
            NameKind::COLUMN,
            NameKind::TABLE,
            NameKind::SCHEMA,
        ];
        for alias_kind in ALIAS_ORDER {
            if !mask.contains(alias_kind) {
                continue;
            }
            let found = tier_match(td, lookup, filter, fold, Tier::Alias(alias_kind));
            if let Some(member) = found {
                trace!(
                    type_name = td.name(),
                    lookup,
                    member = member.name(),
                    alias_kind = ?alias_kind,
                    "alias match"
                );
                return Some(member);
            }
        }
    }

    None
}

/// One search tier: a structural member kind or an alias domain
#[derive(Clone, Copy)]
enum Tier {
    Structural(MemberKind),
    Alias(NameKind),
}

fn tier_name(member: &MemberDescriptor, tier: Tier) -> Option<&str> {
    match tier {
        Tier::Structural(kind) => (member.kind() == kind).then_some(member.name()),
        Tier::Alias(kind) => alias_of(member, kind),
    }
}

/// Match within one tier: exact case-insensitive matches across every
/// member come before any punctuation-folded retry, so folding can never
/// shadow an exact match declared later.
fn tier_match(
    td: &Arc<MemberDescriptor>,
    lookup: &str,
    filter: Option<MemberFilter<'_>>,
    fold: bool,
    tier: Tier,
) -> Option<Arc<MemberDescriptor>> {
    let passes = |member: &MemberDescriptor| filter.map_or(true, |f| f(member));

    for member in td.members() {
        if let Some(name) = tier_name(member, tier) {
            if name.eq_ignore_ascii_case(lookup) && passes(member) {
                return Some(member.clone());
            }
        }
    }

    if fold {
        let target = folded(lookup);
        for member in td.members() {
            if let Some(name) = tier_name(member, tier) {
                if folded(name) == target && passes(member) {
                    return Some(member.clone());
                }
            }
        }
    }

    None
}

fn alias_of(member: &MemberDescriptor, kind: NameKind) -> Option<&str> {
    match kind {
        NameKind::DISPLAY => member.display_name(),
        NameKind::SERIALIZED => member.serialized_name(),
        NameKind::COLUMN => member.column_name(),
        NameKind::TABLE => member.table_name(),
        NameKind::SCHEMA => member.schema_name(),
        _ => None,
    }
}

fn folded(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '.'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{gadget_spec, widget_spec};

    fn widget_td() -> Arc<MemberDescriptor> {
        descriptor::of_type(widget_spec()).unwrap()
    }

    #[test]
    fn test_structural_name_case_insensitive() {
        let td = widget_td();
        let m = resolve(&td, "TITLE", NameKind::all(), None).unwrap();
        assert_eq!(m.name(), "title");
    }

    #[test]
    fn test_empty_and_whitespace_lookups_miss() {
        let td = widget_td();
        assert!(resolve(&td, "", NameKind::all(), None).is_none());
        assert!(resolve(&td, "   ", NameKind::all(), None).is_none());
    }

    #[test]
    fn test_display_alias_with_folding() {
        let td = widget_td();
        let m = resolve(&td, "Widget Title", NameKind::all(), None).unwrap();
        assert_eq!(m.name(), "title");
        let m = resolve(&td, "widgettitle", NameKind::all(), None).unwrap();
        assert_eq!(m.name(), "title");
    }

    #[test]
    fn test_serialized_alias() {
        let td = widget_td();
        let m = resolve(&td, "titleText", NameKind::all(), None).unwrap();
        assert_eq!(m.name(), "title");
    }

    #[test]
    fn test_column_alias_variants() {
        let td = widget_td();
        for lookup in ["widget_id", "WidgetId", "Widget.Id"] {
            let m = resolve(&td, lookup, NameKind::all(), None)
                .unwrap_or_else(|| panic!("{lookup} should resolve"));
            assert_eq!(m.name(), "id");
        }
    }

    #[test]
    fn test_folded_structural_name() {
        let td = widget_td();
        let m = resolve(&td, "OwnerId", NameKind::all(), None).unwrap();
        assert_eq!(m.name(), "owner_id");
    }

    #[test]
    fn test_table_alias_resolves_related_member() {
        let td = descriptor::of_type(gadget_spec()).unwrap();
        let m = resolve(&td, "widgets", NameKind::TABLE, None).unwrap();
        assert_eq!(m.name(), "widget");

        let m = resolve(&td, "catalog", NameKind::SCHEMA, None).unwrap();
        assert_eq!(m.name(), "widget");
    }

    #[test]
    fn test_mask_restricts_domains() {
        let td = widget_td();
        assert!(resolve(&td, "widget_id", NameKind::NAME, None).is_none());
        assert!(resolve(&td, "widget_id", NameKind::COLUMN, None).is_some());
    }

    #[test]
    fn test_memoized_result_is_shared() {
        let td = widget_td();
        let a = resolve(&td, "price", NameKind::all(), None).unwrap();
        let b = resolve(&td, "price", NameKind::all(), None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_filtered_lookup_not_memoized() {
        let td = widget_td();
        let reject_all: MemberFilter<'_> = &|_| false;
        assert!(resolve(&td, "tags", NameKind::all(), Some(reject_all)).is_none());
        // The filtered miss must not poison the unfiltered lookup
        assert!(resolve(&td, "tags", NameKind::all(), None).is_some());
    }

    #[test]
    fn test_alias_fallback_disabled() {
        let td = widget_td();
        let section = ResolverSection {
            alias_fallback: false,
            fold_punctuation: true,
        };
        assert!(resolve_with(&td, "titleText", NameKind::all(), None, &section).is_none());
        assert!(resolve_with(&td, "title", NameKind::all(), None, &section).is_some());
    }

    #[test]
    fn test_folding_disabled() {
        let td = widget_td();
        let section = ResolverSection {
            alias_fallback: true,
            fold_punctuation: false,
        };
        assert!(resolve_with(&td, "Widget.Id", NameKind::all(), None, &section).is_none());
        assert!(resolve_with(&td, "widget_id", NameKind::all(), None, &section).is_some());
    }

    #[test]
    fn test_resolve_path_chains_related_types() {
        let td = descriptor::of_type(gadget_spec()).unwrap();
        let chain = resolve_path(&td, "widget.title", NameKind::all()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[0].name(), "widget");
        assert_eq!(chain[1].name(), "title");
    }

    #[test]
    fn test_resolve_path_through_collections() {
        let td = descriptor::of_type(gadget_spec()).unwrap();
        let chain = resolve_path(&td, "widgets.id", NameKind::all()).unwrap();
        assert_eq!(chain[1].name(), "id");
    }
}
