//! Tile image sources handed to the host.

/// Where a tile's image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileImage {
    /// Served from the store
    Stored { key: String, data: Vec<u8> },
    /// Not stored; the host loads this URL itself
    Online { url: String },
}

impl TileImage {
    pub fn is_stored(&self) -> bool {
        matches!(self, TileImage::Stored { .. })
    }

    /// Stored bytes, if any.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            TileImage::Stored { data, .. } => Some(data),
            TileImage::Online { .. } => None,
        }
    }

    /// Media type of stored bytes, sniffed from their magic number.
    ///
    /// `None` for online tiles and unrecognized formats.
    pub fn content_type(&self) -> Option<&'static str> {
        self.data().and_then(sniff_content_type)
    }
}

/// Identify common raster tile formats by their leading bytes.
pub fn sniff_content_type(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("image/webp")
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("image/gif")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_formats() {
        assert_eq!(sniff_content_type(b"\x89PNG\r\n\x1a\nrest"), Some("image/png"));
        assert_eq!(sniff_content_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_content_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_content_type(b"GIF89a..."), Some("image/gif"));
        assert_eq!(sniff_content_type(b"<html>"), None);
        assert_eq!(sniff_content_type(b""), None);
    }

    #[test]
    fn test_online_has_no_content_type() {
        let tile = TileImage::Online {
            url: "https://a/1/2/3.png".to_string(),
        };
        assert!(!tile.is_stored());
        assert_eq!(tile.content_type(), None);
    }
}
