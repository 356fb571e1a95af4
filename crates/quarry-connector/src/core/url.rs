/// Join the repository URL and a relative resource path with exactly one
/// slash. Spaces in the path are encoded as `+`.
pub(crate) fn build_url(repository_url: &str, path: &str) -> String {
    let path = path.replace(' ', "+");
    if repository_url.ends_with('/') {
        format!("{repository_url}{path}")
    } else {
        format!("{repository_url}/{path}")
    }
}

/// Rewrite a dav-flavoured URL to the underlying http(s) transport.
///
/// `dav:http://…` and `dav:https://…` drop the `dav:` prefix;
/// `dav://…` (no scheme suffix) becomes `http://…`. No dav methods are
/// ever issued, the scheme is transport sugar only.
pub(crate) fn normalize_scheme(url: &str) -> String {
    if let Some(rest) = url.strip_prefix("dav:") {
        rest.to_string()
    } else if let Some(rest) = url.strip_prefix("dav") {
        format!("http{rest}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_with_single_slash() {
        assert_eq!(
            build_url("http://repo.example/releases", "org/demo/demo.jar"),
            "http://repo.example/releases/org/demo/demo.jar"
        );
        assert_eq!(
            build_url("http://repo.example/releases/", "org/demo/demo.jar"),
            "http://repo.example/releases/org/demo/demo.jar"
        );
    }

    #[test]
    fn encodes_spaces_as_plus() {
        assert_eq!(
            build_url("http://repo.example", "org/my project/a.jar"),
            "http://repo.example/org/my+project/a.jar"
        );
    }

    #[test]
    fn strips_dav_prefixes() {
        assert_eq!(
            normalize_scheme("dav:http://repo.example/a"),
            "http://repo.example/a"
        );
        assert_eq!(
            normalize_scheme("dav:https://repo.example/a"),
            "https://repo.example/a"
        );
        assert_eq!(
            normalize_scheme("dav://repo.example/a"),
            "http://repo.example/a"
        );
    }

    #[test]
    fn leaves_plain_http_alone() {
        assert_eq!(
            normalize_scheme("https://repo.example/a"),
            "https://repo.example/a"
        );
    }
}
