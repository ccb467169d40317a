//! Plot titles and per-aesthetic labels.

use super::aes::normalize_aesthetic;
use std::collections::BTreeMap;

/// Title, subtitle, caption and axis/legend labels.
///
/// Labels given with `+ labs(...)` always win. Labels derived from layer
/// mappings and statistic defaults only fill gaps, in the order the layers
/// were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Labs {
    title: Option<String>,
    subtitle: Option<String>,
    caption: Option<String>,
    aesthetics: BTreeMap<String, String>,
}

/// Start a label set.
#[must_use]
pub fn labs() -> Labs {
    Labs::default()
}

/// Label of the x axis.
#[must_use]
pub fn xlab(label: impl Into<String>) -> Labs {
    labs().x(label)
}

/// Label of the y axis.
#[must_use]
pub fn ylab(label: impl Into<String>) -> Labs {
    labs().y(label)
}

/// Plot title.
#[must_use]
pub fn ggtitle(title: impl Into<String>) -> Labs {
    labs().title(title)
}

impl Labs {
    /// Set the title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the subtitle.
    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the caption.
    #[must_use]
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Label for any aesthetic.
    #[must_use]
    pub fn aes(mut self, aesthetic: &str, label: impl Into<String>) -> Self {
        self.aesthetics.insert(normalize_aesthetic(aesthetic), label.into());
        self
    }

    /// Label for x.
    #[must_use]
    pub fn x(self, label: impl Into<String>) -> Self {
        self.aes("x", label)
    }

    /// Label for y.
    #[must_use]
    pub fn y(self, label: impl Into<String>) -> Self {
        self.aes("y", label)
    }

    /// Label for color.
    #[must_use]
    pub fn color(self, label: impl Into<String>) -> Self {
        self.aes("color", label)
    }

    /// Label for fill.
    #[must_use]
    pub fn fill(self, label: impl Into<String>) -> Self {
        self.aes("fill", label)
    }

    /// Title.
    #[must_use]
    pub fn get_title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Subtitle.
    #[must_use]
    pub fn get_subtitle(&self) -> Option<&str> {
        self.subtitle.as_deref()
    }

    /// Caption.
    #[must_use]
    pub fn get_caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    /// Label of an aesthetic.
    #[must_use]
    pub fn get(&self, aesthetic: &str) -> Option<&str> {
        self.aesthetics.get(aesthetic).map(String::as_str)
    }

    /// Overwrite with every label set in `other`.
    pub fn update(&mut self, other: &Labs) {
        if other.title.is_some() {
            self.title.clone_from(&other.title);
        }
        if other.subtitle.is_some() {
            self.subtitle.clone_from(&other.subtitle);
        }
        if other.caption.is_some() {
            self.caption.clone_from(&other.caption);
        }
        for (k, v) in &other.aesthetics {
            self.aesthetics.insert(k.clone(), v.clone());
        }
    }

    /// Add labels for aesthetics that have none yet.
    pub fn add_defaults<I, K, V>(&mut self, defaults: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in defaults {
            self.aesthetics.entry(k.into()).or_insert_with(|| v.into());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_labels_win() {
        let mut l = labs().x("Weight").title("Cars");
        l.add_defaults([("x", "wt"), ("y", "mpg")]);
        assert_eq!(l.get("x"), Some("Weight"));
        assert_eq!(l.get("y"), Some("mpg"));
        assert_eq!(l.get_title(), Some("Cars"));
    }

    #[test]
    fn test_first_default_wins() {
        let mut l = Labs::default();
        l.add_defaults([("y", "count")]);
        l.add_defaults([("y", "density")]);
        assert_eq!(l.get("y"), Some("count"));
    }

    #[test]
    fn test_update_and_spelling() {
        let mut l = xlab("a");
        l.update(&labs().aes("colour", "Group").subtitle("s"));
        assert_eq!(l.get("color"), Some("Group"));
        assert_eq!(l.get("x"), Some("a"));
        assert_eq!(l.get_subtitle(), Some("s"));
        assert_eq!(ggtitle("t").get_title(), Some("t"));
        assert_eq!(ylab("b").get("y"), Some("b"));
    }
}
