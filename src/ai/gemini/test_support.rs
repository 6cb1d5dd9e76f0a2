use wiremock::matchers::{method, path_regex};
use wiremock::MockBuilder;

pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";

pub fn post_path_regex(path: &str) -> MockBuilder {
    wiremock::Mock::given(method("POST")).and(path_regex(path))
}
