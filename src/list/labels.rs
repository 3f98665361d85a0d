//! User-facing wording for list operations, per entity kind.

/// Nouns and fallback messages for one kind of entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLabels {
    pub singular: &'static str,
    pub plural: &'static str,
    /// Shown when the initial load fails without a server message.
    pub list_failure: &'static str,
}

pub const FACTORY_LABELS: EntityLabels = EntityLabels {
    singular: "factory",
    plural: "factories",
    list_failure: "Failed to retrieve the list of factories.",
};

pub const WORKSPACE_LABELS: EntityLabels = EntityLabels {
    singular: "workspace",
    plural: "workspaces",
    list_failure: "Failed to retrieve the list of workspaces.",
};

/// Fallback for refreshes and page-by-key fetches.
pub const UPDATE_FAILED: &str = "Update information failed.";
pub const DELETE_FAILED: &str = "Delete failed.";
pub const DELETE_ACTION: &str = "Delete";

/// Confirmation dialog contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub content: String,
    pub action: String,
}

impl EntityLabels {
    pub fn noun(&self, count: usize) -> &'static str {
        if count == 1 { self.singular } else { self.plural }
    }

    pub fn delete_prompt(&self, count: usize) -> ConfirmPrompt {
        let target = if count > 1 {
            format!("these {} {}?", count, self.plural)
        } else {
            format!("this selected {}?", self.singular)
        };
        ConfirmPrompt {
            title: format!("Remove {}", self.plural),
            content: format!("Would you like to delete {}", target),
            action: DELETE_ACTION.to_string(),
        }
    }

    pub fn removed_message(&self, count: usize) -> String {
        format!("{} {} has been removed.", count, self.noun(count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_for_one_uses_singular_wording() {
        let prompt = FACTORY_LABELS.delete_prompt(1);
        assert_eq!(prompt.title, "Remove factories");
        assert_eq!(prompt.content, "Would you like to delete this selected factory?");
        assert_eq!(prompt.action, "Delete");
    }

    #[test]
    fn prompt_for_many_counts_entities() {
        let prompt = FACTORY_LABELS.delete_prompt(3);
        assert_eq!(prompt.content, "Would you like to delete these 3 factories?");
    }

    #[test]
    fn removed_message_pluralizes() {
        assert_eq!(FACTORY_LABELS.removed_message(1), "1 factory has been removed.");
        assert_eq!(FACTORY_LABELS.removed_message(3), "3 factories has been removed.");
        assert_eq!(WORKSPACE_LABELS.removed_message(2), "2 workspaces has been removed.");
    }
}
