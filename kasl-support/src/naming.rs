//! Service naming rules shared by the container and the derive macro.
//!
//! The container rejects reserved names at runtime; `#[derive(Service)]`
//! rejects them at compile time. Both read the same list from here so the
//! two layers can never disagree.

/// Names of the container's own registration operations.
///
/// A service may not be registered under any of these.
pub const RESERVED_NAMES: &[&str] = &[
    "inject",
    "inject_service",
    "inject_fn",
    "inject_container",
    "add_provider",
];

/// Returns `true` if `name` is one of the built-in [`RESERVED_NAMES`].
///
/// ```
/// use kasl_support::naming::is_reserved;
///
/// assert!(is_reserved("inject"));
/// assert!(!is_reserved("logger"));
/// ```
#[inline]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// Message used for a reserved name, at runtime and at compile time alike.
pub fn reserved_message(name: &str) -> String {
    format!("Reserved service name: {name}")
}

/// Message used for an empty service name, at runtime and at compile time alike.
pub const EMPTY_NAME_MESSAGE: &str = "Service name must not be empty";

/// Converts a type identifier into the default service name.
///
/// ```
/// use kasl_support::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("UserRepository"), "user_repository");
/// assert_eq!(to_snake_case("HTTPClient"), "http_client");
/// ```
pub fn to_snake_case(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();

            // Word boundary: "aB" or the last capital of an acronym ("PClient")
            let boundary = match prev {
                Some(p) if p == '_' => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_operations_are_reserved() {
        for name in ["inject", "inject_service", "inject_fn", "inject_container", "add_provider"] {
            assert!(is_reserved(name), "{name} should be reserved");
        }
    }

    #[test]
    fn ordinary_names_are_not_reserved() {
        assert!(!is_reserved("injector"));
        assert!(!is_reserved("Inject"));
        assert!(!is_reserved(""));
    }

    #[test]
    fn reserved_message_format() {
        assert_eq!(reserved_message("inject"), "Reserved service name: inject");
    }

    #[test]
    fn snake_case_simple() {
        assert_eq!(to_snake_case("Database"), "database");
        assert_eq!(to_snake_case("UserService"), "user_service");
    }

    #[test]
    fn snake_case_acronyms_and_digits() {
        assert_eq!(to_snake_case("HTTPClient"), "http_client");
        assert_eq!(to_snake_case("Oauth2Provider"), "oauth2_provider");
        assert_eq!(to_snake_case("IO"), "io");
    }

    #[test]
    fn snake_case_already_snake() {
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("Mixed_Case"), "mixed_case");
    }
}
