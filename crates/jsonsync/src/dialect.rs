//! Control-key conventions for the two supported wire dialects.

/// Which special-key convention a document uses.
///
/// The compact dialect spends one character per control key and writes
/// identity ids as bare integers. The Newtonsoft dialect matches Json.NET's
/// `PreserveReferencesHandling` output, with `$`-prefixed keys and ids
/// written as strings.
///
/// # Default
///
/// [`Dialect::Compact`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `"\f"` declares identity, `"\r"` is a backreference, `""` wraps list
    /// values, `"\t"` is the type tag. Ids are integers.
    #[default]
    Compact,
    /// `"$id"`, `"$ref"`, `"$values"`, `"$type"`. Ids are strings.
    Newtonsoft,
}

impl Dialect {
    /// Key that declares the identity of the object it opens.
    #[must_use]
    pub fn id_key(self) -> &'static str {
        match self {
            Self::Compact => "\u{c}",
            Self::Newtonsoft => "$id",
        }
    }

    /// Key whose value is the id of a previously declared object.
    #[must_use]
    pub fn ref_key(self) -> &'static str {
        match self {
            Self::Compact => "\r",
            Self::Newtonsoft => "$ref",
        }
    }

    /// Key wrapping the element list of an identity-carrying list.
    #[must_use]
    pub fn values_key(self) -> &'static str {
        match self {
            Self::Compact => "",
            Self::Newtonsoft => "$values",
        }
    }

    /// Key carrying the type tag of the object it opens.
    #[must_use]
    pub fn type_key(self) -> &'static str {
        match self {
            Self::Compact => "\t",
            Self::Newtonsoft => "$type",
        }
    }

    /// Whether ids are written as JSON strings rather than bare integers.
    ///
    /// On read both spellings are accepted for either dialect; this only
    /// controls what the writer emits.
    #[must_use]
    pub fn quotes_ids(self) -> bool {
        matches!(self, Self::Newtonsoft)
    }
}
