use heck::{ToKebabCase, ToSnakeCase};

pub fn snakecase(s: String) -> String {
    s.to_snake_case()
}

pub fn kebabcase(s: String) -> String {
    s.to_kebab_case()
}

/// Quotes a value as a Python string literal.
pub fn pyrepr(s: String) -> String {
    // A JSON string literal is also a valid Python one.
    serde_json::to_string(&s).unwrap_or_default()
}
