use depot_constants::LATEST_TAG;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSpec {
    pub name: String,
    pub selector: String,
}

/// Splits `name@selector`, keeping the leading `@` of scoped names.
/// A bare name selects `latest`.
#[must_use]
pub fn parse_package_spec(spec: &str) -> PackageSpec {
    let spec = spec.trim();
    let (scope_prefix, rest) = match spec.strip_prefix('@') {
        Some(rest) if rest.contains('/') => ("@", rest),
        _ => ("", spec),
    };

    let (name, selector) = match rest.split_once('@') {
        Some((name, selector)) if !name.is_empty() && !selector.is_empty() => {
            (name, selector)
        }
        Some((name, _)) if !name.is_empty() => (name, LATEST_TAG),
        _ => (rest, LATEST_TAG),
    };

    PackageSpec {
        name: format!("{scope_prefix}{name}"),
        selector: selector.to_string(),
    }
}
