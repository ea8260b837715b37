use std::collections::HashSet;
use std::sync::LazyLock;

/// Reserved words of the configuration language.
pub static KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    let mut s = HashSet::new();
    s.insert("val");
    s.insert("import");
    s.insert("this");
    s.insert("null");
    s.insert("true");
    s.insert("false");
    s
});

// Host metadata annotations recognized by the default schema extractors.

/// Marks a type, property, function or constructor as visible to documents.
pub const RESTRICTED: &str = "Restricted";
/// Marks a function (with a configure lambda) or a property as a configuring entry point.
pub const CONFIGURING: &str = "Configuring";
/// Marks a function that creates an element and adds it to its receiver.
pub const ADDING: &str = "Adding";
/// Marks a single-parameter function that stores its argument and returns the receiver.
pub const BUILDER: &str = "Builder";
/// Marks a property whose value is present even when never assigned.
pub const HAS_DEFAULT_VALUE: &str = "HasDefaultValue";
/// Marks a property that stays in the schema but is not addressable by name.
pub const HIDDEN_IN_DSL: &str = "HiddenInDeclarativeDsl";
/// Marks a function parameter that identifies the created element.
pub const IDENTITY_KEY: &str = "IdentityKey";

/// Separator between the accessor id prefix and the extension name.
pub const CUSTOM_ACCESSOR_SEPARATOR: char = ':';

/// Parser and schema format version constants.
pub const PARSER_VERSION: &str = "0.3.0";
pub const SCHEMA_FORMAT_VERSION: &str = "1.0";
