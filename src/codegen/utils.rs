//! Naming and type-name helpers used by the emitters.

/// Suffix appended to a friendly type name when the field is nullable
pub const NULLABLE_MARKER: &str = "?";

/// Convert an underscore-separated identifier to PascalCase.
///
/// Empty segments are dropped. A single-character first segment is dropped
/// entirely, so `"m_total"` becomes `"Total"`.
pub fn to_pascal_case(name: &str) -> String {
    name.split('_')
        .filter(|token| !token.is_empty())
        .enumerate()
        .filter(|(index, token)| *index != 0 || token.chars().count() > 1)
        .map(|(_, token)| capitalize(token))
        .collect()
}

fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Convert a PascalCase identifier to a human-readable display name.
///
/// A trailing `" Id"` is stripped, so `"CustomerId"` becomes `"Customer"`.
pub fn to_display_name(name: &str) -> String {
    let mut display_name = String::with_capacity(name.len() * 2);

    for c in name.chars() {
        if c.is_ascii_uppercase() {
            display_name.push(' ');
        }
        display_name.push(c);
    }

    if display_name.ends_with(" Id") && display_name.len() > 3 {
        display_name.truncate(display_name.len() - 3);
    }

    display_name.trim().to_string()
}

/// Map a storage type name to the spelling used in generated source.
///
/// Unknown names pass through unchanged.
pub fn friendly_type_name(type_name: &str, is_nullable: bool) -> String {
    let friendly = match type_name.to_lowercase().as_str() {
        "string" => "string",
        "int32" => "int",
        "int64" => "long",
        "double" => "double",
        "decimal" => "decimal",
        "boolean" => "bool",
        "byte" => "byte",
        "byte[]" => "byte[]",
        _ => type_name,
    };

    if is_nullable {
        format!("{}{}", friendly, NULLABLE_MARKER)
    } else {
        friendly.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("customer_id"), "CustomerId");
        assert_eq!(to_pascal_case("_foo"), "Foo");
        assert_eq!(to_pascal_case(""), "");
        assert_eq!(to_pascal_case("___"), "");
        assert_eq!(to_pascal_case("m_total"), "Total");
        assert_eq!(to_pascal_case("x"), "");
        assert_eq!(to_pascal_case("order__line_total"), "OrderLineTotal");
        assert_eq!(to_pascal_case("ab_c"), "AbC");
    }

    #[test]
    fn test_to_pascal_case_is_idempotent_on_single_tokens() {
        for name in ["Customer", "OrderLine", "RowVersion", "Id"] {
            assert_eq!(to_pascal_case(name), name);
            assert_eq!(to_pascal_case(&to_pascal_case(name)), name);
        }
    }

    #[test]
    fn test_to_display_name() {
        assert_eq!(to_display_name("CustomerId"), "Customer");
        assert_eq!(to_display_name("OrderTotal"), "Order Total");
        assert_eq!(to_display_name("OrderLineTotal"), "Order Line Total");
        assert_eq!(to_display_name("Id"), "Id");
        assert_eq!(to_display_name(""), "");
        assert_eq!(to_display_name("name"), "name");
    }

    #[test]
    fn test_friendly_type_name() {
        assert_eq!(friendly_type_name("Int32", false), "int");
        assert_eq!(friendly_type_name("Int32", true), "int?");
        assert_eq!(friendly_type_name("INT64", false), "long");
        assert_eq!(friendly_type_name("Boolean", true), "bool?");
        assert_eq!(friendly_type_name("Byte[]", false), "byte[]");
        assert_eq!(friendly_type_name("Guid", false), "Guid");
        assert_eq!(friendly_type_name("DateTime", true), "DateTime?");
    }
}
