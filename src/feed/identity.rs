//! Content-derived identifiers for feed items.
//!
//! The id is the lowercase hex MD5 of the canonical link. Existing stores and
//! the static site both key on it, so the digest must never change.

use md5::{Digest, Md5};

const IMAGE_URL_BASE: &str = "https://picsum.photos/seed";

pub fn item_id(link: &str) -> String {
    format!("{:x}", Md5::digest(link.as_bytes()))
}

/// Placeholder image seeded by the item id.
pub fn image_url(id: &str) -> String {
    format!("{}/{}/800/400", IMAGE_URL_BASE, id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_md5_hex_of_link() {
        assert_eq!(item_id(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            item_id("The quick brown fox jumps over the lazy dog"),
            "9e107d9d372bb6826bd81d3542a419d6"
        );
    }

    #[test]
    fn id_is_stable_and_distinct() {
        let a = item_id("http://x/1");
        assert_eq!(a, item_id("http://x/1"));
        assert_ne!(a, item_id("http://x/2"));
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn image_url_embeds_id() {
        let id = item_id("http://x/1");
        assert_eq!(
            image_url(&id),
            format!("https://picsum.photos/seed/{}/800/400", id)
        );
    }
}
