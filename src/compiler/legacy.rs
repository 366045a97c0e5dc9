//! Rewrites for node titles retired by the vision library.

use tracing::warn;

use crate::dsl::NodeEntry;

pub struct LegacyAlias {
    pub old_title: &'static str,
    pub new_title: &'static str,
    /// Config field renamed along with the node, as `(old, new)`.
    pub renamed_field: (&'static str, &'static str),
}

/// Closed rewrite table. Titles not listed here are left alone.
pub const LEGACY_ALIASES: &[LegacyAlias] = &[
    LegacyAlias {
        old_title: "input.live",
        new_title: "input.visual",
        renamed_field: ("input_source", "source"),
    },
    LegacyAlias {
        old_title: "input.recorded",
        new_title: "input.visual",
        renamed_field: ("input_dir", "source"),
    },
];

pub fn find_alias(title: &str) -> Option<&'static LegacyAlias> {
    LEGACY_ALIASES.iter().find(|alias| alias.old_title == title)
}

/// Applies the rewrite table to one entry, logging when it fires.
pub fn rewrite(entry: NodeEntry) -> NodeEntry {
    let Some(alias) = find_alias(entry.title()) else {
        return entry;
    };
    warn!("'{}' is replaced by '{}'", alias.old_title, alias.new_title);

    match entry {
        NodeEntry::Bare(_) => NodeEntry::Bare(alias.new_title.to_string()),
        NodeEntry::Configured { mut config, .. } => {
            let (old_field, new_field) = alias.renamed_field;
            // The renamed field replaces any value already under the new name.
            if config.iter().any(|(key, _)| key == old_field) {
                config.retain(|(key, _)| key != new_field);
            }
            for (key, _) in config.iter_mut() {
                if *key == old_field {
                    *key = new_field.to_string();
                }
            }
            NodeEntry::Configured {
                title: alias.new_title.to_string(),
                config,
            }
        }
    }
}
