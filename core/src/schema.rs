//! Which reply elements are collections.
//!
//! The service's reply schema is large and not declared anywhere; these two
//! tables are the only knowledge `ResponseNode` has about it. Extend them here
//! when a new repeated element shows up.

/// Container tag → tag of its repeated children.
pub static CONTAINERS: &[(&str, &str)] = &[
    ("arguments", "argument"),
    ("contacts", "contact"),
    ("errors", "error"),
    ("groups", "group"),
    ("list", "taskseries"),
    ("methods", "method"),
    ("notes", "note"),
    ("participants", "participant"),
    ("tags", "tag"),
    ("tasks", "list"),
    ("timezones", "timezone"),
];

/// (node tag, field name) → relative path of repeated descendants, for
/// collections that are not a direct child container.
pub static NESTED_LISTS: &[((&str, &str), &str)] = &[(("list", "deleted"), "deleted/taskseries")];

/// Item tag held by `container`, if it is a known container.
pub fn item_tag(container: &str) -> Option<&'static str> {
    CONTAINERS
        .iter()
        .find(|(tag, _)| *tag == container)
        .map(|(_, item)| *item)
}

/// Relative path for the nested collection `field` of a `node` element.
pub fn nested_path(node: &str, field: &str) -> Option<&'static str> {
    NESTED_LISTS
        .iter()
        .find(|((tag, name), _)| *tag == node && *name == field)
        .map(|(_, path)| *path)
}
