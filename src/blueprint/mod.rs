//! API Blueprint output
//!
//! One `.apib` file per group. Each recorded exchange becomes its own
//! `## name [METHOD uri]` action, in recording order.

mod render;
mod writer;

pub use render::render_group;
pub use writer::write_blueprints;

use std::sync::LazyLock;

use regex::Regex;

/// Extension of generated files
pub const EXTENSION: &str = "apib";

/// An acronym run followed by a capitalized word: `OAuth` -> `O_Auth`
static ACRONYM_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"([A-Z\d]+)([A-Z][a-z])").expect("acronym boundary pattern is invalid")
});

/// A lower-case letter or digit followed by a capital: `authTokens` -> `auth_Tokens`
static WORD_BOUNDARY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"([a-z\d])([A-Z])").expect("word boundary pattern is invalid")
});

/// Underscore inflection: split camel case on case boundaries, turn `-`
/// into `_` and lower-case the result
///
/// Any other character, spaces included, is left where it is.
#[must_use]
pub fn underscore(word: &str) -> String {
    let word = ACRONYM_BOUNDARY.replace_all(word, "${1}_${2}");
    let word = WORD_BOUNDARY.replace_all(&word, "${1}_${2}");
    word.replace('-', "_").to_lowercase()
}

/// File name a group is written to
///
/// `"User Accounts"` becomes `user_accounts.apib`, `"OAuthTokens"`
/// becomes `o_auth_tokens.apib`. Every space maps to its own `_`.
#[must_use]
pub fn file_name(group: &str) -> String {
    let stem = underscore(group).replace(' ', "_");
    format!("{stem}.{EXTENSION}")
}

/// Escape a parameter name the way a query string would
#[must_use]
pub fn query_escape(raw: &str) -> String {
    urlencoding::encode(raw).replace("%20", "+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("Users"), "users.apib");
        assert_eq!(file_name("User Accounts"), "user_accounts.apib");
        assert_eq!(file_name("OAuthTokens"), "o_auth_tokens.apib");
        assert_eq!(file_name("billingHistory"), "billing_history.apib");
        assert_eq!(file_name("HTTPServer v2"), "http_server_v2.apib");
        assert_eq!(file_name("api-keys"), "api_keys.apib");
    }

    #[test]
    fn test_file_name_keeps_punctuation_and_spacing() {
        assert_eq!(file_name("User  Accounts"), "user__accounts.apib");
        assert_eq!(file_name("Users & Orders"), "users_&_orders.apib");
        assert_eq!(file_name("C++ API"), "c++_api.apib");
        assert_ne!(file_name("Users & Orders"), file_name("Users Orders"));
    }

    #[test]
    fn test_query_escape() {
        assert_eq!(query_escape("limit"), "limit");
        assert_eq!(query_escape("page size"), "page+size");
        assert_eq!(query_escape("a&b"), "a%26b");
        assert_eq!(query_escape("filter[name]"), "filter%5Bname%5D");
    }

    proptest! {
        #[test]
        fn prop_file_name_is_lower_snake(group in "[A-Za-z][A-Za-z ]{0,20}") {
            let name = file_name(&group);

            prop_assert!(name.ends_with(".apib"));
            let stem = name.trim_end_matches(".apib");
            prop_assert!(!stem.contains(' '));
            prop_assert!(stem.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
            prop_assert_eq!(stem.replace('_', ""), group.replace(' ', "").to_lowercase());
        }

        #[test]
        fn prop_lower_case_groups_only_lose_spaces(group in "[a-z0-9 &.+]{1,20}") {
            prop_assert_eq!(file_name(&group), format!("{}.apib", group.replace(' ', "_")));
        }
    }
}
