use serde::{Deserialize, Serialize};
use std::fmt;

/// How an attribute's values compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Text,
    Integer,
    /// Multi-valued; only membership (`value@attribute`) applies.
    Set,
}

impl AttributeKind {
    pub fn name(self) -> &'static str {
        match self {
            AttributeKind::Text => "text",
            AttributeKind::Integer => "integer",
            AttributeKind::Set => "set",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Item fields a query can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Name,
    Comment,
    Filetype,
    Width,
    Height,
    /// 10 for 16:10, 9 for 16:9, 4 for 4:3, 1 for square, otherwise 0.
    Aspect,
    Rating,
    Nsfw,
    Size,
    Tags,
}

impl Attribute {
    pub const ALL: [Attribute; 10] = [
        Attribute::Name,
        Attribute::Comment,
        Attribute::Filetype,
        Attribute::Width,
        Attribute::Height,
        Attribute::Aspect,
        Attribute::Rating,
        Attribute::Nsfw,
        Attribute::Size,
        Attribute::Tags,
    ];

    /// Exact, case-sensitive lookup.
    ///
    /// ```
    /// use search_catalog::Attribute;
    /// assert_eq!(Attribute::from_name("rating"), Some(Attribute::Rating));
    /// assert_eq!(Attribute::from_name("Rating"), None);
    /// assert_eq!(Attribute::from_name("bogus_field"), None);
    /// ```
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attribute| attribute.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Name => "name",
            Attribute::Comment => "comment",
            Attribute::Filetype => "filetype",
            Attribute::Width => "width",
            Attribute::Height => "height",
            Attribute::Aspect => "aspect",
            Attribute::Rating => "rating",
            Attribute::Nsfw => "nsfw",
            Attribute::Size => "size",
            Attribute::Tags => "tags",
        }
    }

    pub fn kind(self) -> AttributeKind {
        match self {
            Attribute::Name | Attribute::Comment | Attribute::Filetype => AttributeKind::Text,
            Attribute::Width
            | Attribute::Height
            | Attribute::Aspect
            | Attribute::Rating
            | Attribute::Nsfw
            | Attribute::Size => AttributeKind::Integer,
            Attribute::Tags => AttributeKind::Set,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Aspect class of a `width` x `height` picture.
pub fn aspect_class(width: u32, height: u32) -> i64 {
    let (width, height) = (u64::from(width), u64::from(height));
    if width == 0 || height == 0 {
        0
    } else if 16 * height == 10 * width {
        10
    } else if 16 * height == 9 * width {
        9
    } else if 4 * height == 3 * width {
        4
    } else if height == width {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for attribute in Attribute::ALL {
            assert_eq!(Attribute::from_name(attribute.name()), Some(attribute));
        }
    }

    #[test]
    fn kinds() {
        assert_eq!(Attribute::Name.kind(), AttributeKind::Text);
        assert_eq!(Attribute::Rating.kind(), AttributeKind::Integer);
        assert_eq!(Attribute::Tags.kind(), AttributeKind::Set);
    }

    #[test]
    fn aspect_classes() {
        assert_eq!(aspect_class(640, 400), 10);
        assert_eq!(aspect_class(1920, 1080), 9);
        assert_eq!(aspect_class(640, 480), 4);
        assert_eq!(aspect_class(320, 240), 4);
        assert_eq!(aspect_class(100, 100), 1);
        assert_eq!(aspect_class(500, 300), 0);
        assert_eq!(aspect_class(0, 0), 0);
    }
}
