use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

selector!(IMAGE_SELECTOR, "img[src]");
// Images uploaded to private repositories are only reachable with the
// short-lived token in the `jwt` query parameter.
regex!(
    PRIVATE_IMAGE_REGEX,
    r"^https://private-user-images\.githubusercontent\.com/(?:[^/?#]+/)*([^/?#]+)\?(?:[^#]*&)?jwt="
);
