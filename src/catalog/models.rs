use serde::{Deserialize, Serialize};

/// Which remote collection a request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Anime,
    Drama,
}

impl Category {
    pub fn toggled(self) -> Self {
        match self {
            Category::Anime => Category::Drama,
            Category::Drama => Category::Anime,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Anime => "Anime",
            Category::Drama => "Korean Drama",
        }
    }

    /// Wire name used by the catalog backend
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Anime => "anime",
            Category::Drama => "drama",
        }
    }

    /// Drama sources are served without extra playback headers
    pub fn wants_playback_headers(&self) -> bool {
        matches!(self, Category::Anime)
    }

    pub const ALL: &'static [Category] = &[Category::Anime, Category::Drama];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    pub name: String,
    /// Opaque catalog identifier, only valid within the category it came from
    pub path: String,
    #[serde(default)]
    pub img: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub path: String,
}

impl Episode {
    /// Episode number as shown to the user: the trailing token of the name
    /// ("Episode 12" -> "12").
    pub fn number(&self) -> &str {
        self.name
            .split_whitespace()
            .next_back()
            .unwrap_or(self.name.as_str())
    }

    /// Short label for episode buttons
    pub fn label(&self) -> String {
        format!("EP {}", self.number())
    }

    /// Now-playing title for this episode of `show_title`
    pub fn display_title(&self, show_title: &str, category: Category) -> String {
        match category {
            Category::Anime => format!("{} Episode {}", show_title, self.number()),
            Category::Drama => self.name.clone(),
        }
    }
}

/// Resolved stream location; `None` means the source has no playable stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamUrl {
    pub data: Option<String>,
}

impl StreamUrl {
    pub fn playable(&self) -> Option<&str> {
        self.data.as_deref().filter(|url| !url.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(name: &str) -> Episode {
        Episode {
            name: name.to_string(),
            path: "/e".to_string(),
        }
    }

    #[test]
    fn test_episode_number_is_trailing_token() {
        assert_eq!(episode("Episode 12").number(), "12");
        assert_eq!(episode("Naruto Shippuden Episode 500").number(), "500");
        assert_eq!(episode("Special").number(), "Special");
        assert_eq!(episode("Episode 3 ").number(), "3");
    }

    #[test]
    fn test_episode_label() {
        assert_eq!(episode("Episode 7").label(), "EP 7");
    }

    #[test]
    fn test_display_title_anime_is_recomputed() {
        let ep = episode("Episode 1");
        assert_eq!(ep.display_title("Naruto", Category::Anime), "Naruto Episode 1");
        // Calling again must not accumulate suffixes
        assert_eq!(ep.display_title("Naruto", Category::Anime), "Naruto Episode 1");
    }

    #[test]
    fn test_display_title_drama_is_verbatim() {
        let ep = episode("S1E1 finale");
        assert_eq!(ep.display_title("Show X", Category::Drama), "S1E1 finale");
    }

    #[test]
    fn test_category_toggle_and_wire_names() {
        assert_eq!(Category::Anime.toggled(), Category::Drama);
        assert_eq!(Category::Drama.toggled(), Category::Anime);
        assert_eq!(serde_json::to_string(&Category::Drama).unwrap(), "\"drama\"");
        assert!(Category::Anime.wants_playback_headers());
        assert!(!Category::Drama.wants_playback_headers());
    }

    #[test]
    fn test_show_img_is_optional() {
        let show: Show = serde_json::from_str(r#"{"name":"Naruto","path":"/naruto"}"#).unwrap();
        assert_eq!(show.img, None);
        let show: Show =
            serde_json::from_str(r#"{"name":"Naruto","path":"/naruto","img":null}"#).unwrap();
        assert_eq!(show.img, None);
    }

    #[test]
    fn test_stream_url_playable() {
        assert_eq!(StreamUrl { data: None }.playable(), None);
        assert_eq!(StreamUrl { data: Some(String::new()) }.playable(), None);
        assert_eq!(
            StreamUrl {
                data: Some("https://cdn/x.m3u8".to_string())
            }
            .playable(),
            Some("https://cdn/x.m3u8")
        );
    }
}
