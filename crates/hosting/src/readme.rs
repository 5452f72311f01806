use crate::ImageToCache;
use crate::consts::{IMAGE_SELECTOR, PRIVATE_IMAGE_REGEX};
use scraper::Html;

/// Private images referenced by `<img src>` in readme HTML, in document
/// order and without duplicates.
pub fn private_images(html: &str) -> Vec<ImageToCache> {
    let document = Html::parse_fragment(html);
    let mut images: Vec<ImageToCache> = Vec::new();
    for src in document.select(&IMAGE_SELECTOR).filter_map(|img| img.value().attr("src")) {
        let Some(captures) = PRIVATE_IMAGE_REGEX.captures(src) else {
            continue;
        };
        if images.iter().any(|image| image.original_url == src) {
            continue;
        }
        images.push(ImageToCache {
            original_url: src.to_string(),
            file_name: captures[1].to_string(),
        });
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_images() {
        let html = r#"
            <html>
            <body>
                <img src="https://private-user-images.githubusercontent.com/with-jwt-1.jpg?jwt=some-jwt" />
                <img src="https://private-user-images.githubusercontent.com/123/with-jwt-2.jpg?X-Amz=1&jwt=some-jwt" />
                <img src="https://private-user-images.githubusercontent.com/without-jwt.jpg" />
                <img src="https://img.shields.io/badge.svg?jwt=not-private" />
                <img src="https://private-user-images.githubusercontent.com/with-jwt-1.jpg?jwt=some-jwt" />
            </body>
            </html>
        "#;
        let images = private_images(html);
        let names: Vec<_> = images.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, ["with-jwt-1.jpg", "with-jwt-2.jpg"]);
        assert_eq!(
            images[0].original_url,
            "https://private-user-images.githubusercontent.com/with-jwt-1.jpg?jwt=some-jwt"
        );
    }

    #[test]
    fn test_no_images() {
        assert!(private_images("<p>Just text</p>").is_empty());
    }
}
